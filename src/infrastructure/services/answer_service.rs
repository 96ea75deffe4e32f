//! Retrieval-augmented answering

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::knowledge::{KnowledgeStore, SearchParams};
use crate::domain::provider::{GenerationOptions, ANSWERING_TASK};
use crate::domain::rag::{
    assemble_context, build_answer_prompt, confidence, AskError, RagAnswer, RagStage,
};
use crate::infrastructure::embedding::EmbeddingClient;
use crate::infrastructure::provider::ProviderManager;

/// Default ask search parameters: fewer, looser matches than plain search
pub const DEFAULT_ASK_PARAMS: SearchParams = SearchParams {
    limit: 3,
    threshold: 0.6,
};

/// Answers questions from the knowledge base.
///
/// Each request runs embedding, search, context assembly and generation in
/// order. Any failure ends the request; no answer is produced without the
/// retrieved context.
#[derive(Clone)]
pub struct AnswerService {
    store: Arc<dyn KnowledgeStore>,
    embeddings: Arc<EmbeddingClient>,
    providers: Arc<ProviderManager>,
    params: SearchParams,
    options: GenerationOptions,
}

impl std::fmt::Debug for AnswerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerService")
            .field("store", &self.store.store_name())
            .field("providers", &self.providers)
            .field("params", &self.params)
            .finish()
    }
}

impl AnswerService {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embeddings: Arc<EmbeddingClient>,
        providers: Arc<ProviderManager>,
    ) -> Self {
        Self {
            store,
            embeddings,
            providers,
            params: DEFAULT_ASK_PARAMS,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn ask(&self, question: &str) -> Result<RagAnswer, AskError> {
        self.ask_with_cancellation(question, &CancellationToken::new())
            .await
    }

    /// Like [`ask`](Self::ask), abandoning the request once `cancel` fires.
    ///
    /// The token is checked between stages and raced against every
    /// external call, so a cancelled request makes no further calls.
    pub async fn ask_with_cancellation(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<RagAnswer, AskError> {
        let result = self.run(question, cancel).await;

        match &result {
            Ok(answer) => {
                debug!(stage = %RagStage::Done, "Ask stage");
                info!(
                    provider = %answer.provider,
                    sources = answer.sources.len(),
                    confidence = answer.confidence,
                    "Question answered"
                );
            }
            Err(e) => debug!(stage = %RagStage::Failed, error = %e, "Ask stage"),
        }

        result
    }

    async fn run(&self, question: &str, cancel: &CancellationToken) -> Result<RagAnswer, AskError> {
        enter(RagStage::Embedding);
        let query = guard(cancel, self.embeddings.embed(question))
            .await?
            .map_err(AskError::Retrieval)?;

        enter(RagStage::Searching);
        let hits = guard(cancel, self.store.search(&query, self.params))
            .await?
            .map_err(AskError::Search)?;

        enter(RagStage::ContextAssembly);
        checkpoint(cancel)?;
        let context = assemble_context(&hits);
        let prompt = build_answer_prompt(&context, question);
        debug!(hits = hits.len(), context_chars = context.len(), "Context assembled");

        enter(RagStage::Generating);
        let provider = guard(cancel, self.providers.resolve_provider(ANSWERING_TASK))
            .await?
            .map_err(AskError::from_generation)?;
        let generation = guard(cancel, provider.generate(&prompt, self.options))
            .await?
            .map_err(AskError::from_generation)?;

        Ok(RagAnswer {
            answer: generation.text,
            confidence: confidence(&hits),
            sources: hits,
            provider: generation.provider,
            model: generation.model,
            usage: generation.usage,
        })
    }
}

fn enter(stage: RagStage) {
    debug!(stage = %stage, "Ask stage");
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), AskError> {
    if cancel.is_cancelled() {
        return Err(AskError::Cancelled);
    }
    Ok(())
}

/// Run `call` unless `cancel` fires first; a fired token never starts the call
async fn guard<T>(cancel: &CancellationToken, call: impl Future<Output = T>) -> Result<T, AskError> {
    checkpoint(cancel)?;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AskError::Cancelled),
        value = call => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::knowledge::{MockKnowledgeStore, NewChunk, NewDocument};
    use crate::domain::provider::{MockAiProvider, ProviderKind, ToolProviderMapping};
    use crate::domain::DomainError;
    use crate::infrastructure::knowledge::InMemoryKnowledgeStore;
    use crate::infrastructure::provider::ProviderRegistry;

    const QUESTION: &str = "Who should we sell to?";

    fn embedding_provider() -> Arc<MockEmbeddingProvider> {
        Arc::new(
            MockEmbeddingProvider::new("mock", 3).with_vector(QUESTION, vec![1.0, 0.0, 0.0]),
        )
    }

    fn manager(providers: Vec<Arc<MockAiProvider>>) -> Arc<ProviderManager> {
        let registry = providers
            .into_iter()
            .fold(ProviderRegistry::builder(), |b, p| b.register(p))
            .build();
        Arc::new(ProviderManager::new(
            Arc::new(registry),
            Arc::new(ToolProviderMapping::defaults()),
        ))
    }

    fn answer_service(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<MockEmbeddingProvider>,
        providers: Vec<Arc<MockAiProvider>>,
    ) -> AnswerService {
        let embeddings = Arc::new(EmbeddingClient::new(embedder, "mock-embedding", 3));
        AnswerService::new(store, embeddings, manager(providers))
    }

    async fn seeded_store() -> Arc<InMemoryKnowledgeStore> {
        let store = Arc::new(InMemoryKnowledgeStore::new(3));
        store
            .insert_document(
                NewDocument::new("ICP guide", "...")
                    .with_source_url("https://example.com/icp")
                    .with_tag("sales"),
                vec![
                    NewChunk::new(0, "Sell to B2B SaaS founders.", 6, vec![0.9, 0.1, 0.0]),
                    NewChunk::new(1, "Unrelated appendix.", 4, vec![0.0, 0.0, 1.0]),
                ],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let deepseek = Arc::new(MockAiProvider::new(ProviderKind::DeepSeek).with_text("B2B founders."));
        let service = answer_service(seeded_store().await, embedding_provider(), vec![deepseek.clone()]);

        let answer = service.ask(QUESTION).await.unwrap();

        assert_eq!(answer.answer, "B2B founders.");
        assert_eq!(answer.provider, ProviderKind::DeepSeek);
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].title, "ICP guide");
        assert_eq!(answer.sources[0].source_url.as_deref(), Some("https://example.com/icp"));
        assert_eq!(answer.sources[0].tags, vec!["sales"]);
        assert_eq!(answer.sources[0].chunk_index, 0);
        assert_eq!(answer.sources[0].content, "Sell to B2B SaaS founders.");
        assert!(answer.confidence > 0.9);

        let prompt = deepseek.last_prompt().unwrap();
        assert!(prompt.system.is_some());
        assert!(prompt.user.contains("ICP guide\nSell to B2B SaaS founders."));
        assert!(prompt.user.contains(QUESTION));
        assert!(!prompt.user.contains("Unrelated appendix."));
    }

    #[tokio::test]
    async fn test_empty_store_still_answers() {
        let deepseek = Arc::new(MockAiProvider::new(ProviderKind::DeepSeek));
        let service = answer_service(
            Arc::new(InMemoryKnowledgeStore::new(3)),
            embedding_provider(),
            vec![deepseek.clone()],
        );

        let answer = service.ask(QUESTION).await.unwrap();

        assert!(answer.sources.is_empty());
        assert_eq!(answer.confidence, 0.0);
        assert!(!answer.answer.is_empty());
        assert!(deepseek
            .last_prompt()
            .unwrap()
            .user
            .contains("(no relevant documents found)"));
    }

    #[tokio::test]
    async fn test_no_configured_provider_is_unavailable() {
        let service = answer_service(
            seeded_store().await,
            embedding_provider(),
            vec![
                Arc::new(MockAiProvider::unconfigured(ProviderKind::DeepSeek)),
                Arc::new(MockAiProvider::unconfigured(ProviderKind::Anthropic)),
            ],
        );

        let err = service.ask(QUESTION).await.unwrap_err();

        assert!(matches!(err, AskError::NoProviderAvailable(_)));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_generation_failure_has_no_fallback_answer() {
        let service = answer_service(
            seeded_store().await,
            embedding_provider(),
            vec![Arc::new(
                MockAiProvider::new(ProviderKind::DeepSeek).with_error("HTTP 500"),
            )],
        );

        let err = service.ask(QUESTION).await.unwrap_err();

        assert!(matches!(err, AskError::Generation(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_retrieval_error() {
        let deepseek = Arc::new(MockAiProvider::new(ProviderKind::DeepSeek));
        let service = answer_service(
            seeded_store().await,
            Arc::new(MockEmbeddingProvider::new("mock", 3).with_error("timeout")),
            vec![deepseek.clone()],
        );

        let err = service.ask(QUESTION).await.unwrap_err();

        assert!(matches!(err, AskError::Retrieval(_)));
        assert_eq!(deepseek.probes(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_search_error() {
        let mut store = MockKnowledgeStore::new();
        store.expect_store_name().return_const("mock");
        store
            .expect_search()
            .times(1)
            .returning(|_, _| Err(DomainError::store("relation does not exist")));
        let deepseek = Arc::new(MockAiProvider::new(ProviderKind::DeepSeek));
        let service = answer_service(Arc::new(store), embedding_provider(), vec![deepseek.clone()]);

        let err = service.ask(QUESTION).await.unwrap_err();

        assert!(matches!(err, AskError::Search(_)));
        assert_eq!(deepseek.generations(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_calls() {
        let mut store = MockKnowledgeStore::new();
        store.expect_store_name().return_const("mock");
        store.expect_search().times(0);
        let embedder = embedding_provider();
        let deepseek = Arc::new(MockAiProvider::new(ProviderKind::DeepSeek));
        let service = answer_service(Arc::new(store), embedder.clone(), vec![deepseek.clone()]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = service
            .ask_with_cancellation(QUESTION, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AskError::Cancelled));
        assert_eq!(embedder.calls(), 0);
        assert_eq!(deepseek.probes(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_mid_request_skips_generation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let mut store = MockKnowledgeStore::new();
        store.expect_store_name().return_const("mock");
        store.expect_search().times(1).returning(move |_, _| {
            trigger.cancel();
            Ok(vec![])
        });
        let deepseek = Arc::new(MockAiProvider::new(ProviderKind::DeepSeek));
        let service = answer_service(Arc::new(store), embedding_provider(), vec![deepseek.clone()]);

        let err = service
            .ask_with_cancellation(QUESTION, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AskError::Cancelled));
        assert_eq!(deepseek.probes(), 0);
        assert_eq!(deepseek.generations(), 0);
    }
}
