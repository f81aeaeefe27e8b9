//! Question-answering chain
//!
//! Runs one query through retrieve, categorize, intent and answer stages,
//! then records the turn in the session history.
//!
//! ```text
//! RETRIEVE -> CATEGORIZE -> INTENT -> ANSWER -> HISTORY_UPDATE -> DONE
//!                |             |
//!                |             +-> out of domain | awaiting selection
//!                +-> out of domain | awaiting selection
//! ```
//!
//! A multi-option category or intent suspends the chain: `ask` returns
//! `ChainOutcome::AwaitingSelection` and the caller re-enters through
//! `resume` with the user's pick, or drops the query through `abandon`.
//! Any model failure degrades to the configured fallback message without
//! touching history.

use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ChainAnswer, ChainConfig, ChainOutcome, DisambiguationDetection, DisambiguationStage,
    LabelResolution, PendingDisambiguation,
};
use crate::domain::ports::{ChatMessage, LanguageModel, TokenCounter};
use crate::services::conversation::{dedup_ordered, ConversationState};
use crate::services::prompts::PromptSet;
use crate::services::retriever::Retriever;

/// Orchestrator settings, taken from `ChainConfig` plus the history budget.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Documents retrieved per query.
    pub top_k: usize,
    /// Reply for questions outside the FAQ.
    pub out_of_domain_message: String,
    /// Reply when a model or retrieval step fails.
    pub fallback_message: String,
    /// Context text used when retrieval finds nothing.
    pub no_context_placeholder: String,
    /// Answer out of domain without calling the model when retrieval finds nothing.
    pub short_circuit_on_no_match: bool,
    /// How ambiguous label responses are recognised.
    pub disambiguation: DisambiguationDetection,
    /// Token budget for the rendered conversation history.
    pub max_history_tokens: usize,
}

impl ChainSettings {
    /// Settings from the `[chain]` section and the history budget.
    pub fn from_config(chain: &ChainConfig, max_history_tokens: usize) -> Self {
        Self {
            top_k: chain.top_k,
            out_of_domain_message: chain.out_of_domain_message.clone(),
            fallback_message: chain.fallback_message.clone(),
            no_context_placeholder: chain.no_context_placeholder.clone(),
            short_circuit_on_no_match: chain.short_circuit_on_no_match,
            disambiguation: chain.disambiguation,
            max_history_tokens,
        }
    }
}

/// Three-stage answer chain: category, then intent, then answer.
///
/// Each stage may suspend with `ChainOutcome::AwaitingSelection` when the
/// model offers several labels.
pub struct QaOrchestrator {
    retriever: Arc<Retriever>,
    model: Arc<dyn LanguageModel>,
    counter: Arc<dyn TokenCounter>,
    prompts: PromptSet,
    settings: ChainSettings,
}

impl QaOrchestrator {
    /// Assemble an orchestrator from its parts.
    pub fn new(
        retriever: Arc<Retriever>,
        model: Arc<dyn LanguageModel>,
        counter: Arc<dyn TokenCounter>,
        prompts: PromptSet,
        settings: ChainSettings,
    ) -> Self {
        Self {
            retriever,
            model,
            counter,
            prompts,
            settings,
        }
    }

    /// Orchestrator with the built-in prompts, or their configured overrides.
    pub fn from_config(
        retriever: Arc<Retriever>,
        model: Arc<dyn LanguageModel>,
        counter: Arc<dyn TokenCounter>,
        chain: &ChainConfig,
        max_history_tokens: usize,
    ) -> Self {
        let prompts = PromptSet::new(&chain.prompts, chain.out_of_domain_message.clone());
        let settings = ChainSettings::from_config(chain, max_history_tokens);
        Self::new(retriever, model, counter, prompts, settings)
    }

    /// Run the chain for a fresh query.
    pub async fn ask(&self, session: &mut ConversationState, query: &str) -> ChainOutcome {
        let span = info_span!("qa_chain", session_id = %session.session_id());
        async {
            let documents = self.retriever.retrieve(query, self.settings.top_k).await;

            if documents.is_none() && self.settings.short_circuit_on_no_match {
                info!("No relevant documents, answering out of domain");
                return self.out_of_domain();
            }

            let context = self.context_text(documents.as_deref());
            let prompt = self.prompts.category(&context);

            match self.classify(prompt, query.to_string()).await {
                Err(e) => self.degraded("category", &e),
                Ok(LabelResolution::OutOfDomain) => {
                    info!(stage = "category", "Model flagged query as out of domain");
                    self.out_of_domain()
                }
                Ok(LabelResolution::Ambiguous { raw, options }) => {
                    info!(stage = "category", options = options.len(), "Awaiting selection");
                    ChainOutcome::AwaitingSelection(PendingDisambiguation {
                        stage: DisambiguationStage::Category,
                        query: query.to_string(),
                        documents,
                        category: None,
                        prompt_text: raw,
                        options,
                    })
                }
                Ok(LabelResolution::Definitive(category)) => {
                    self.from_intent(session, query, documents, category).await
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Continue a suspended chain with the user's selection.
    ///
    /// The trimmed selection is used verbatim as the label. An empty
    /// selection leaves the chain suspended.
    pub async fn resume(
        &self,
        session: &mut ConversationState,
        pending: PendingDisambiguation,
        selection: &str,
    ) -> ChainOutcome {
        let selection = selection.trim();
        if selection.is_empty() {
            return ChainOutcome::AwaitingSelection(pending);
        }

        let span = info_span!(
            "qa_chain",
            session_id = %session.session_id(),
            resumed = %pending.stage
        );
        let selection = selection.to_string();

        async move {
            debug!(selection = %selection, "Resuming with selection");
            match pending.stage {
                DisambiguationStage::Category => {
                    self.from_intent(session, &pending.query, pending.documents, selection)
                        .await
                }
                DisambiguationStage::Intent => {
                    let category = pending.category.unwrap_or_default();
                    self.answer(session, &pending.query, pending.documents, category, selection)
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Drop a suspended query. History is left untouched.
    pub fn abandon(&self, pending: PendingDisambiguation) {
        info!(stage = %pending.stage, "Disambiguation abandoned");
    }

    async fn from_intent(
        &self,
        session: &mut ConversationState,
        query: &str,
        documents: Option<Vec<String>>,
        category: String,
    ) -> ChainOutcome {
        let context = self.context_text(documents.as_deref());
        let prompt = self.prompts.intent(&context, &category);
        let question = PromptSet::intent_question(query, &category);

        match self.classify(prompt, question).await {
            Err(e) => self.degraded("intent", &e),
            Ok(LabelResolution::OutOfDomain) => {
                info!(stage = "intent", "Model flagged query as out of domain");
                self.out_of_domain()
            }
            Ok(LabelResolution::Ambiguous { raw, options }) => {
                info!(stage = "intent", options = options.len(), "Awaiting selection");
                ChainOutcome::AwaitingSelection(PendingDisambiguation {
                    stage: DisambiguationStage::Intent,
                    query: query.to_string(),
                    documents,
                    category: Some(category),
                    prompt_text: raw,
                    options,
                })
            }
            Ok(LabelResolution::Definitive(intent)) => {
                self.answer(session, query, documents, category, intent).await
            }
        }
    }

    async fn answer(
        &self,
        session: &mut ConversationState,
        query: &str,
        documents: Option<Vec<String>>,
        category: String,
        intent: String,
    ) -> ChainOutcome {
        if intent.trim() == self.settings.out_of_domain_message.trim() {
            return self.out_of_domain();
        }

        let context = self.context_text(documents.as_deref());
        let history = session.render();
        let messages = [
            ChatMessage::system(self.prompts.answer(&context, &category, &intent, &history)),
            ChatMessage::user(query),
        ];

        let answer = match self.model.generate(&messages).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => return self.degraded("answer", &e),
        };

        session.append(query, &answer, documents.as_deref());
        session.truncate(self.settings.max_history_tokens, self.counter.as_ref());

        info!(category = %category, intent = %intent, "Answered");
        ChainOutcome::Completed(ChainAnswer {
            category,
            intent,
            answer,
        })
    }

    async fn classify(&self, system_prompt: String, user: String) -> DomainResult<LabelResolution> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user)];
        let response = self.model.generate(&messages).await?;
        Ok(LabelResolution::parse(
            &response,
            &self.settings.out_of_domain_message,
            self.settings.disambiguation,
        ))
    }

    fn context_text(&self, documents: Option<&[String]>) -> String {
        match documents {
            Some(docs) if !docs.is_empty() => {
                dedup_ordered(docs.iter().map(String::as_str)).join("\n\n")
            }
            _ => self.settings.no_context_placeholder.clone(),
        }
    }

    fn out_of_domain(&self) -> ChainOutcome {
        ChainOutcome::OutOfDomain {
            message: self.settings.out_of_domain_message.clone(),
        }
    }

    fn degraded(&self, stage: &str, error: &dyn std::fmt::Display) -> ChainOutcome {
        warn!(stage, error = %error, "Model call failed, answering with fallback");
        ChainOutcome::Degraded {
            message: self.settings.fallback_message.clone(),
        }
    }
}
