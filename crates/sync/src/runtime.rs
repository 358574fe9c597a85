//! Mission view runtime
//!
//! Drives a `MissionView` on a tokio task. User inputs and request
//! completions are funnelled into one loop and applied one at a time, so the
//! view state is never touched concurrently. After each message the fresh
//! projection is published on a `watch` channel; notices go out on an
//! unbounded `mpsc` channel.
//!
//! Dropping the `ViewHandle` (or calling `shutdown`) tears the view down:
//! the live channel is closed and in-flight requests are aborted.

use crate::channel::TelemetrySource;
use crate::context::{CredentialProvider, ViewContext};
use crate::dispatcher::ControlDispatcher;
use crate::error::SyncError;
use crate::loader;
use crate::subscription::SubscriptionId;
use crate::view::{Effect, MissionView, Notice, Ticket};
use futures_util::StreamExt;
use std::sync::Arc;
use surveylink_mission::{
    ControlCommand, MissionId, MissionPlan, MissionStatus, Projection, StateSnapshot,
    TelemetrySample,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

type CommandReply = oneshot::Sender<Result<MissionStatus, SyncError>>;

enum Input {
    Navigate(MissionId),
    Leave,
    Command {
        command: ControlCommand,
        reply: CommandReply,
    },
}

enum Completion {
    Plan(Ticket, Result<MissionPlan, SyncError>),
    State(Ticket, Result<StateSnapshot, SyncError>),
    Command {
        ticket: Ticket,
        command: ControlCommand,
        result: Result<MissionStatus, SyncError>,
        reply: CommandReply,
    },
    ChannelConnected(SubscriptionId),
    Telemetry(SubscriptionId, TelemetrySample),
    ChannelClosed(SubscriptionId, Option<SyncError>),
}

/// Output side of a running view
#[derive(Debug)]
pub struct ViewEvents {
    /// Latest projection; `None` until a plan is loaded
    pub frames: watch::Receiver<Option<Projection>>,
    /// Camera directives and operator notices, in order
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

/// Input side of a running view
#[derive(Debug)]
pub struct ViewHandle {
    inputs: mpsc::UnboundedSender<Input>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Navigate(id) => f.debug_tuple("Navigate").field(id).finish(),
            Input::Leave => f.write_str("Leave"),
            Input::Command { command, .. } => {
                f.debug_struct("Command").field("command", command).finish()
            }
        }
    }
}

impl ViewHandle {
    /// Show `mission_id`
    pub fn navigate(&self, mission_id: impl Into<MissionId>) -> Result<(), SyncError> {
        self.inputs
            .send(Input::Navigate(mission_id.into()))
            .map_err(|_| SyncError::ViewClosed)
    }

    /// Stop showing any mission
    pub fn leave(&self) -> Result<(), SyncError> {
        self.inputs
            .send(Input::Leave)
            .map_err(|_| SyncError::ViewClosed)
    }

    /// Issue a control command and wait for the backend-confirmed status.
    ///
    /// Fails with `Discarded` if the view moved on before the response arrived.
    pub async fn send_command(&self, command: ControlCommand) -> Result<MissionStatus, SyncError> {
        let (reply, response) = oneshot::channel();
        self.inputs
            .send(Input::Command { command, reply })
            .map_err(|_| SyncError::ViewClosed)?;
        response.await.map_err(|_| SyncError::ViewClosed)?
    }

    /// Tear the view down and wait for the runtime to finish
    pub async fn shutdown(self) {
        let ViewHandle { inputs, task } = self;
        drop(inputs);
        if let Err(e) = task.await {
            if e.is_panic() {
                warn!(error = %e, "mission view runtime panicked");
            }
        }
    }
}

/// Start a mission view runtime on the current tokio runtime
pub fn spawn(ctx: ViewContext) -> (ViewHandle, ViewEvents) {
    let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
    let (frames_tx, frames_rx) = watch::channel(None);
    let (notices_tx, notices_rx) = mpsc::unbounded_channel();

    let runtime = ViewRuntime {
        view: MissionView::new(ctx.view.clone()),
        dispatcher: ControlDispatcher::new(ctx.api.clone()),
        ctx,
        inbox: inbox_tx,
        frames: frames_tx,
        notices: notices_tx,
        requests: JoinSet::new(),
        channel: None,
    };
    let task = tokio::spawn(runtime.run(inputs_rx, inbox_rx));

    (
        ViewHandle {
            inputs: inputs_tx,
            task,
        },
        ViewEvents {
            frames: frames_rx,
            notices: notices_rx,
        },
    )
}

/// Event loop owning one `MissionView`
pub struct ViewRuntime {
    ctx: ViewContext,
    view: MissionView,
    dispatcher: ControlDispatcher,
    inbox: mpsc::UnboundedSender<Completion>,
    frames: watch::Sender<Option<Projection>>,
    notices: mpsc::UnboundedSender<Notice>,
    requests: JoinSet<()>,
    channel: Option<(SubscriptionId, JoinHandle<()>)>,
}

impl ViewRuntime {
    async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<Input>,
        mut inbox: mpsc::UnboundedReceiver<Completion>,
    ) {
        debug!("mission view runtime started");
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.handle_input(input).await,
                    None => break,
                },
                Some(completion) = inbox.recv() => self.handle_completion(completion).await,
                Some(joined) = self.requests.join_next(), if !self.requests.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(error = %e, "mission view request task panicked");
                        }
                    }
                }
            }
            self.publish();
        }

        let effects = self.view.leave();
        self.execute(effects).await;
        self.requests.abort_all();
        self.publish();
        debug!("mission view runtime stopped");
    }

    async fn handle_input(&mut self, input: Input) {
        match input {
            Input::Navigate(mission_id) => {
                let effects = self.view.navigate(mission_id);
                self.execute(effects).await;
            }
            Input::Leave => {
                let effects = self.view.leave();
                self.execute(effects).await;
            }
            Input::Command { command, reply } => match self.view.request_command(command) {
                Ok(ticket) => self.spawn_command(ticket, command, reply),
                Err(e) => {
                    debug!(%command, error = %e, "control command rejected before send");
                    let _ = reply.send(Err(e));
                }
            },
        }
    }

    async fn handle_completion(&mut self, completion: Completion) {
        let effects = match completion {
            Completion::Plan(ticket, result) => self.view.on_plan_loaded(&ticket, result),
            Completion::State(ticket, result) => self.view.on_hydrated(&ticket, result),
            Completion::Command {
                ticket,
                command,
                result,
                reply,
            } => match self.view.on_command_result(&ticket, command, &result) {
                Some(effects) => {
                    let _ = reply.send(result);
                    effects
                }
                None => {
                    let _ = reply.send(Err(SyncError::Discarded));
                    Vec::new()
                }
            },
            Completion::ChannelConnected(id) => {
                self.view.on_channel_connected(&id);
                Vec::new()
            }
            Completion::Telemetry(id, sample) => self.view.on_telemetry(&id, sample),
            Completion::ChannelClosed(id, error) => {
                if self.channel.as_ref().is_some_and(|(current, _)| current == &id) {
                    self.channel = None;
                }
                self.view.on_channel_lost(&id, error)
            }
        };
        self.execute(effects).await;
    }

    async fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadPlan(ticket) => self.spawn_load(ticket),
                Effect::Hydrate(ticket) => self.spawn_hydrate(ticket),
                Effect::OpenChannel(id) => self.open_channel(id),
                Effect::CloseChannel(id) => self.close_channel(&id).await,
                Effect::Notify(notice) => {
                    let _ = self.notices.send(notice);
                }
            }
        }
    }

    fn publish(&self) {
        let next = self.view.projection();
        self.frames.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn spawn_load(&mut self, ticket: Ticket) {
        let api = self.ctx.api.clone();
        let credentials = self.ctx.credentials.clone();
        let inbox = self.inbox.clone();
        self.requests.spawn(async move {
            let result = match credentials.bearer_token().await {
                Ok(token) => loader::load_plan(api.as_ref(), &ticket.mission_id, &token).await,
                Err(e) => Err(e),
            };
            let _ = inbox.send(Completion::Plan(ticket, result));
        });
    }

    fn spawn_hydrate(&mut self, ticket: Ticket) {
        let api = self.ctx.api.clone();
        let credentials = self.ctx.credentials.clone();
        let inbox = self.inbox.clone();
        self.requests.spawn(async move {
            let result = match credentials.bearer_token().await {
                Ok(token) => loader::hydrate(api.as_ref(), &ticket.mission_id, &token).await,
                Err(e) => Err(e),
            };
            let _ = inbox.send(Completion::State(ticket, result));
        });
    }

    fn spawn_command(&mut self, ticket: Ticket, command: ControlCommand, reply: CommandReply) {
        let dispatcher = self.dispatcher.clone();
        let credentials = self.ctx.credentials.clone();
        let inbox = self.inbox.clone();
        self.requests.spawn(async move {
            let result = match credentials.bearer_token().await {
                Ok(token) => {
                    dispatcher
                        .send_unchecked(&ticket.mission_id, command, &token)
                        .await
                }
                Err(e) => Err(e),
            };
            let _ = inbox.send(Completion::Command {
                ticket,
                command,
                result,
                reply,
            });
        });
    }

    fn open_channel(&mut self, id: SubscriptionId) {
        info!(mission_id = %id.mission_id, serial = id.serial, "opening telemetry channel");
        let pump = tokio::spawn(pump_channel(
            id.clone(),
            self.ctx.telemetry.clone(),
            self.ctx.credentials.clone(),
            self.inbox.clone(),
        ));
        self.channel = Some((id, pump));
    }

    async fn close_channel(&mut self, id: &SubscriptionId) {
        let Some((current, pump)) = self.channel.take() else {
            return;
        };
        if &current != id {
            self.channel = Some((current, pump));
            return;
        }
        info!(mission_id = %id.mission_id, serial = id.serial, "closing telemetry channel");
        pump.abort();
        // The old connection must be gone before a new one is opened.
        let _ = pump.await;
    }
}

impl std::fmt::Debug for ViewRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRuntime")
            .field("view", &self.view)
            .field("requests", &self.requests.len())
            .field("channel", &self.channel.as_ref().map(|(id, _)| id))
            .finish()
    }
}

async fn pump_channel(
    id: SubscriptionId,
    source: Arc<dyn TelemetrySource>,
    credentials: Arc<dyn CredentialProvider>,
    inbox: mpsc::UnboundedSender<Completion>,
) {
    let error = match stream_into(&id, source, credentials, &inbox).await {
        Ok(()) => None,
        Err(e) => {
            warn!(mission_id = %id.mission_id, error = %e, "telemetry channel failed");
            Some(e)
        }
    };
    info!(mission_id = %id.mission_id, serial = id.serial, "telemetry channel ended");
    let _ = inbox.send(Completion::ChannelClosed(id, error));
}

async fn stream_into(
    id: &SubscriptionId,
    source: Arc<dyn TelemetrySource>,
    credentials: Arc<dyn CredentialProvider>,
    inbox: &mpsc::UnboundedSender<Completion>,
) -> Result<(), SyncError> {
    let token = credentials.bearer_token().await?;
    let mut stream = source.connect(&id.mission_id, &token).await?;
    if inbox.send(Completion::ChannelConnected(id.clone())).is_err() {
        return Ok(());
    }

    while let Some(item) = stream.next().await {
        match item {
            Ok(sample) => {
                if inbox
                    .send(Completion::Telemetry(id.clone(), sample))
                    .is_err()
                {
                    return Ok(());
                }
            }
            // Already logged by the decoder; keep the channel up.
            Err(SyncError::Protocol(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
