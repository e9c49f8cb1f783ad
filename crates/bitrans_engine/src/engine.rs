use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bitrans_core::{GlossaryRequest, JobId, SplitRequest, TranslationRequest};
use engine_logging::{engine_debug, engine_error, engine_info};
use tokio_util::sync::CancellationToken;

use crate::glossary::extract_glossary;
use crate::llm::{ClientSettings, LlmClient, ReqwestLlmClient};
use crate::orchestrator::{ChannelEventSink, TranslationOrchestrator};
use crate::retry::{Sleeper, TokioSleeper};
use crate::split::assist_split;
use crate::{EngineEvent, EngineStopped, LlmError};

enum EngineCommand {
    Translate(Box<TranslationRequest>),
    Cancel { job_id: JobId },
    Split(Box<SplitRequest>),
    ExtractGlossary(Box<GlossaryRequest>),
    Shutdown,
}

type TokenMap = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Background runtime executing engine work; results come back as events.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, LlmError> {
        let client = ReqwestLlmClient::new(settings)?;
        Ok(Self::with_client(Arc::new(client), Arc::new(TokioSleeper)))
    }

    pub fn with_client(client: Arc<dyn LlmClient>, sleeper: Arc<dyn Sleeper>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let orchestrator =
            Arc::new(TranslationOrchestrator::new(client.clone()).with_sleeper(sleeper));
        let tokens: TokenMap = Arc::default();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                if matches!(command, EngineCommand::Shutdown) {
                    engine_info!("engine shutting down");
                    break;
                }
                dispatch(
                    &runtime,
                    command,
                    &client,
                    &orchestrator,
                    &tokens,
                    &event_tx,
                );
            }
            engine_debug!("engine command loop finished");
        });

        Self { cmd_tx, event_rx }
    }

    /// Starts a job; any job still running is cancelled first.
    pub fn translate(&self, request: TranslationRequest) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::Translate(Box::new(request)));
    }

    pub fn cancel(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { job_id });
    }

    pub fn split(&self, request: SplitRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Split(Box::new(request)));
    }

    pub fn extract_glossary(&self, request: GlossaryRequest) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::ExtractGlossary(Box::new(request)));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for an event. `Ok(None)` means nothing arrived
    /// yet; `Err` means the engine thread has exited.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    /// Stops the engine thread. Work in flight is dropped with its runtime.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

fn dispatch(
    runtime: &tokio::runtime::Runtime,
    command: EngineCommand,
    client: &Arc<dyn LlmClient>,
    orchestrator: &Arc<TranslationOrchestrator>,
    tokens: &TokenMap,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Translate(request) => {
            let job_id = request.job_id;
            let token = CancellationToken::new();
            if let Ok(mut tokens) = tokens.lock() {
                for (previous, token) in tokens.drain() {
                    engine_info!("job {} superseded by job {}", previous, job_id);
                    token.cancel();
                }
                tokens.insert(job_id, token.clone());
            }
            let orchestrator = orchestrator.clone();
            let tokens = tokens.clone();
            let sink = ChannelEventSink::new(event_tx.clone());
            runtime.spawn(async move {
                orchestrator.run(&request, &token, &sink).await;
                if let Ok(mut tokens) = tokens.lock() {
                    tokens.remove(&job_id);
                }
            });
        }
        EngineCommand::Cancel { job_id } => {
            let token = tokens
                .lock()
                .ok()
                .and_then(|mut tokens| tokens.remove(&job_id));
            match token {
                Some(token) => token.cancel(),
                None => engine_debug!("cancel for job {}: not running", job_id),
            }
        }
        EngineCommand::Split(request) => {
            let client = client.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let outcome = assist_split(client.as_ref(), &request).await;
                let _ = event_tx.send(EngineEvent::SplitFinished(outcome));
            });
        }
        EngineCommand::Shutdown => {}
        EngineCommand::ExtractGlossary(request) => {
            let client = client.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = extract_glossary(client.as_ref(), &request)
                    .await
                    .map_err(|err| err.to_string());
                let _ = event_tx.send(EngineEvent::GlossaryFinished {
                    generation: request.generation,
                    result,
                });
            });
        }
    }
}
