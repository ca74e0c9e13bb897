//! Orchestrator use case
//!
//! Drives one chat through the fixed pipeline: `C` layer cycles, each
//! feeding its merged text forward as `helper_response`, then one final
//! synthesis agent whose answer is streamed.
//!
//! ```text
//! chat(input)
//!   cycle 1 ── Layer::invoke ──▶ Intermediate{1} | Error{1}
//!   ...
//!   cycle C ── Layer::invoke ──▶ Intermediate{C} | Error{C}
//!   final   ── Agent::stream_chunked ──▶ Output | Error
//!   memory.push(input, output)
//! ```
//!
//! Events are produced by a spawned task and read through [`ChatStream`].
//! Dropping the stream cancels the chat.

use crate::config::ExecutionParams;
use crate::ports::model_backend::BackendGateway;
use crate::ports::observer::{ChatObserver, NoObserver};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use crate::use_cases::agent::{Agent, AgentError, InvokeOptions};
use crate::use_cases::layer::{Layer, LayerError};
use futures::Stream;
use moa_domain::core::text::bound_chars;
use moa_domain::{
    Chunker, ConfigError, Context, ConversationMemory, LayerFailurePolicy, LayerSpec, MoaConfig,
    PromptTemplate, ResponseEvent, Tokenizer, WhitespaceTokenizer, slots,
};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Capacity of the event channel between the chat task and its stream.
const EVENT_BUFFER: usize = 32;

/// Shared handle to an orchestrator's conversation memory.
pub type SharedMemory = Arc<RwLock<ConversationMemory>>;

/// One call to [`Orchestrator::chat`].
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub input: String,
    /// Additional template slots (e.g. `brief`). The core slots
    /// (`input`, `transcript`, `history`, `helper_response`) take precedence.
    pub extra: Context,
    pub transcript: Option<String>,
    /// Append the turn to memory when the chat succeeds.
    pub save: bool,
}

impl ChatRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            extra: Context::new(),
            transcript: None,
            save: true,
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(slot, value);
        self
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn without_save(mut self) -> Self {
        self.save = false;
        self
    }
}

/// Events of one chat, in emission order.
///
/// Finite and not restartable. Dropping it (or calling
/// [`cancel`](Self::cancel)) stops the chat; events already received stay
/// valid.
pub struct ChatStream {
    receiver: mpsc::Receiver<ResponseEvent>,
    cancel: CancellationToken,
}

impl ChatStream {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next event, or `None` once the chat is over.
    pub async fn next_event(&mut self) -> Option<ResponseEvent> {
        self.receiver.recv().await
    }
}

impl Stream for ChatStream {
    type Item = ResponseEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Inner {
    layers: Vec<Arc<Layer>>,
    main: Agent,
    reference: PromptTemplate,
    params: ExecutionParams,
    chunker: Chunker,
    observer: Arc<dyn ChatObserver>,
    logger: Arc<dyn TranscriptLogger>,
}

/// The layered mixture-of-agents pipeline.
///
/// Built once per configuration; reconfiguring means building a new one
/// and carrying [`memory`](Self::memory) over if the conversation should
/// continue.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
    memory: SharedMemory,
}

impl Orchestrator {
    pub fn builder(config: MoaConfig, gateway: Arc<dyn BackendGateway>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config, gateway)
    }

    /// Build with default observer, logger and a fresh memory.
    pub fn from_config(
        config: MoaConfig,
        params: ExecutionParams,
        gateway: Arc<dyn BackendGateway>,
    ) -> Result<Self, ConfigError> {
        Self::builder(config, gateway).with_params(params).build()
    }

    pub fn cycles(&self) -> usize {
        self.inner.layers.len()
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.inner.params
    }

    pub fn main_agent(&self) -> &Agent {
        &self.inner.main
    }

    /// Agent names of the layer run on `cycle` (1-based).
    pub fn layer_names(&self, cycle: usize) -> Vec<String> {
        cycle
            .checked_sub(1)
            .and_then(|i| self.inner.layers.get(i))
            .map(|layer| layer.names())
            .unwrap_or_default()
    }

    pub fn memory(&self) -> SharedMemory {
        Arc::clone(&self.memory)
    }

    pub async fn clear_memory(&self) {
        self.memory.write().await.clear();
    }

    /// Start a chat. Must be called inside a Tokio runtime.
    pub fn chat(&self, request: ChatRequest) -> ChatStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();

        let inner = Arc::clone(&self.inner);
        let memory = Arc::clone(&self.memory);
        let token = cancel.clone();
        tokio::spawn(async move {
            run_chat(inner, memory, request, tx, token).await;
        });

        ChatStream {
            receiver: rx,
            cancel,
        }
    }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    config: MoaConfig,
    gateway: Arc<dyn BackendGateway>,
    params: ExecutionParams,
    layers: Option<Vec<LayerSpec>>,
    tokenizer: Arc<dyn Tokenizer>,
    observer: Arc<dyn ChatObserver>,
    logger: Arc<dyn TranscriptLogger>,
    memory: Option<SharedMemory>,
}

impl OrchestratorBuilder {
    pub fn new(config: MoaConfig, gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            config,
            gateway,
            params: ExecutionParams::default(),
            layers: None,
            tokenizer: Arc::new(WhitespaceTokenizer),
            observer: Arc::new(NoObserver),
            logger: Arc::new(NoTranscriptLogger),
            memory: None,
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    /// One layer per cycle instead of the configured layer repeated.
    pub fn with_layers(mut self, layers: Vec<LayerSpec>) -> Self {
        self.layers = Some(layers);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn TranscriptLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Continue an existing conversation.
    pub fn with_memory(mut self, memory: SharedMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Validate the configuration and resolve every backend.
    pub fn build(self) -> Result<Orchestrator, ConfigError> {
        let config = self.config;
        config.ensure_valid()?;
        self.params.chunking.validate()?;

        let gateway = self.gateway.as_ref();
        let main = Agent::bind(config.main_agent_spec()?, gateway)?;
        let reference = config.reference_template()?;

        let layers = match self.layers {
            Some(specs) => {
                if specs.len() != config.cycles {
                    return Err(ConfigError::Invalid(format!(
                        "{} layers given for {} cycles",
                        specs.len(),
                        config.cycles
                    )));
                }
                specs
                    .iter()
                    .map(|spec| Layer::bind(spec, gateway).map(Arc::new))
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let layer = Arc::new(Layer::bind(&config.layer_spec()?, gateway)?);
                vec![layer; config.cycles]
            }
        };

        info!(
            cycles = layers.len(),
            agents = layers.first().map(|l| l.len()).unwrap_or(0),
            main = %config.main_model,
            "Orchestrator ready"
        );

        Ok(Orchestrator {
            inner: Arc::new(Inner {
                layers,
                main,
                reference,
                chunker: Chunker::new(self.params.chunking, self.tokenizer),
                params: self.params,
                observer: self.observer,
                logger: self.logger,
            }),
            memory: self.memory.unwrap_or_default(),
        })
    }
}

async fn run_chat(
    inner: Arc<Inner>,
    memory: SharedMemory,
    request: ChatRequest,
    tx: mpsc::Sender<ResponseEvent>,
    cancel: CancellationToken,
) {
    let limits = inner.params.limits;
    let history = memory.read().await.render();
    let transcript = request
        .transcript
        .as_deref()
        .map(|t| bound_chars(t, limits.max_transcript_chars))
        .unwrap_or_default();

    let base = request
        .extra
        .clone()
        .with(slots::INPUT, request.input.clone())
        .with(slots::TRANSCRIPT, transcript)
        .with(slots::HISTORY, history);

    let opts = InvokeOptions {
        retry: inner.params.retry,
        chunker: inner.chunker.clone(),
        cancel: cancel.clone(),
        observer: Arc::clone(&inner.observer),
        logger: Arc::clone(&inner.logger),
    };

    let total = inner.layers.len();
    info!(cycles = total, "Starting chat");

    let mut helper_response = String::new();
    for (i, layer) in inner.layers.iter().enumerate() {
        let cycle = i + 1;
        inner.observer.on_cycle_start(cycle, total, &layer.names());

        let ctx = base.clone().with(
            slots::HELPER_RESPONSE,
            bound_chars(&helper_response, limits.max_helper_chars),
        );

        let event = match layer.invoke(&ctx, &inner.reference, cycle, &opts).await {
            Ok(merge) => {
                info!(
                    cycle,
                    contributors = merge.contributors.len(),
                    failed = merge.failed.len(),
                    "Cycle merged"
                );
                inner.logger.log(TranscriptEvent::new(
                    "cycle_merged",
                    serde_json::json!({
                        "cycle": cycle,
                        "contributors": merge.contributors,
                        "failed": merge.failed,
                        "outputs": merge.individual_outputs,
                    }),
                ));
                inner.observer.on_cycle_complete(cycle, true);
                helper_response = merge.aggregated_text.clone();
                ResponseEvent::intermediate(&merge, cycle)
            }
            Err(LayerError::Cancelled) => {
                info!(cycle, "Chat cancelled");
                return;
            }
            Err(e) => {
                warn!(cycle, "Cycle failed: {}", e);
                inner.logger.log(TranscriptEvent::new(
                    "cycle_failed",
                    serde_json::json!({ "cycle": cycle, "error": e.to_string() }),
                ));
                inner.observer.on_cycle_complete(cycle, false);
                if tx
                    .send(ResponseEvent::layer_error(e.to_string(), cycle))
                    .await
                    .is_err()
                {
                    return;
                }
                match inner.params.on_layer_failure {
                    LayerFailurePolicy::Degrade => continue,
                    LayerFailurePolicy::FailFast => return,
                }
            }
        };

        if tx.send(event).await.is_err() {
            return;
        }
    }

    let final_ctx = base.with(
        slots::HELPER_RESPONSE,
        bound_chars(&helper_response, limits.max_helper_chars),
    );
    inner.observer.on_final_start(inner.main.name());

    match inner.main.stream_chunked(&final_ctx, &opts).await {
        Ok(output) => {
            inner.observer.on_final_complete(true);
            // Only a turn the caller received is remembered; the stream
            // stays open until the write is done.
            let delivered = tx.send(ResponseEvent::output(output.clone())).await.is_ok();
            let saved = request.save && delivered;
            if saved {
                memory.write().await.push(request.input.clone(), output.clone());
            } else if !delivered {
                info!("Chat stream closed before the answer was delivered");
            }
            inner.logger.log(TranscriptEvent::new(
                "chat_completed",
                serde_json::json!({
                    "input": request.input,
                    "output": output,
                    "delivered": delivered,
                    "saved": saved,
                }),
            ));
            info!(chars = output.len(), delivered, "Chat completed");
        }
        Err(AgentError::Cancelled) => {
            info!("Chat cancelled during final stage");
        }
        Err(e) => {
            warn!("Final agent failed: {}", e);
            inner.observer.on_final_complete(false);
            inner.logger.log(TranscriptEvent::new(
                "chat_failed",
                serde_json::json!({ "input": request.input, "error": e.to_string() }),
            ));
            let _ = tx.send(ResponseEvent::final_error(e.to_string())).await;
        }
    }
}
