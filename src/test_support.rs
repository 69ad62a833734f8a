//! Test support utilities shared across unit and integration tests.
//!
//! [`ScriptedApi`] stands in for the Hetzner Cloud API: it returns canned
//! resources, records every call in order, and fails selected operations on
//! request. [`RecordingUi`] captures progress lines for assertions.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, ParseError, Utc};

use crate::api::{ApiFuture, CloudApi};
use crate::hcloud::HcloudError;
use crate::hcloud::types::{
    Action, ActionStatus, Architecture, ChangeTypeOpts, EnableRescueOpts, EnableRescueResult,
    Image, ImageListOpts, Ipv4Assignment, PublicNet, Server, ServerCreateOpts,
    ServerCreateResult, ServerId, ServerType, SshKey,
};
use crate::ui::Ui;

/// Provider operations that can be scripted to fail.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Operation {
    /// SSH key lookup.
    GetSshKey,
    /// Server type lookup.
    GetServerType,
    /// Image listing.
    ListImages,
    /// Server creation.
    CreateServer,
    /// Server deletion.
    DeleteServer,
    /// Server type change.
    ChangeServerType,
    /// Power on.
    PowerOnServer,
    /// Hard reset.
    ResetServer,
    /// Rescue enablement.
    EnableRescue,
    /// Rescue disablement.
    DisableRescue,
}

/// A call observed by [`ScriptedApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiCall {
    /// SSH key lookup.
    GetSshKey(String),
    /// Server type lookup.
    GetServerType(String),
    /// Image listing.
    ListImages(ImageListOpts),
    /// Server creation.
    CreateServer(ServerCreateOpts),
    /// Server deletion.
    DeleteServer(ServerId),
    /// Server type change.
    ChangeServerType {
        /// Target server.
        id: ServerId,
        /// Requested server type.
        server_type: String,
        /// Whether the disk was upgraded.
        upgrade_disk: bool,
    },
    /// Power on.
    PowerOnServer(ServerId),
    /// Hard reset.
    ResetServer(ServerId),
    /// Rescue enablement.
    EnableRescue {
        /// Target server.
        id: ServerId,
        /// Requested rescue type.
        rescue_type: String,
        /// Keys authorised for the rescue system.
        ssh_key_ids: Vec<i64>,
    },
    /// Rescue disablement.
    DisableRescue(ServerId),
    /// Action wait.
    WatchAction {
        /// Action identifier.
        id: i64,
        /// Command of the awaited action.
        command: String,
    },
}

impl ApiCall {
    /// Short label used when asserting call order.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::GetSshKey(_) => "get_ssh_key",
            Self::GetServerType(_) => "get_server_type",
            Self::ListImages(_) => "list_images",
            Self::CreateServer(_) => "create_server",
            Self::DeleteServer(_) => "delete_server",
            Self::ChangeServerType { .. } => "change_server_type",
            Self::PowerOnServer(_) => "power_on_server",
            Self::ResetServer(_) => "reset_server",
            Self::EnableRescue { .. } => "enable_rescue",
            Self::DisableRescue(_) => "disable_rescue",
            Self::WatchAction { .. } => "watch_action",
        }
    }
}

#[derive(Debug)]
struct ScriptedState {
    server: Server,
    server_types: BTreeMap<String, ServerType>,
    ssh_keys: BTreeMap<String, SshKey>,
    images: Vec<Image>,
    next_action_commands: Vec<String>,
    root_password: String,
    failing_calls: BTreeSet<Operation>,
    failing_actions: BTreeSet<String>,
    next_action_id: i64,
    calls: Vec<ApiCall>,
}

/// Default identifier assigned to servers created through [`ScriptedApi`].
pub const SCRIPTED_SERVER_ID: ServerId = 4_242;

/// Default public address of servers created through [`ScriptedApi`].
pub const SCRIPTED_SERVER_IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 10);

/// Scripted [`CloudApi`] double.
#[derive(Clone, Debug)]
pub struct ScriptedApi {
    state: Arc<Mutex<ScriptedState>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedApi {
    /// Creates a double that knows the `cx21`, `cx22`, and `cx32` x86 server
    /// types and hands out a server with rescue mode disabled.
    #[must_use]
    pub fn new() -> Self {
        let server_types = [("cx22", 1), ("cx32", 2), ("cx21", 3)]
            .into_iter()
            .map(|(name, id)| {
                (
                    name.to_owned(),
                    ServerType {
                        id,
                        name: name.to_owned(),
                        architecture: Architecture::X86,
                    },
                )
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(ScriptedState {
                server: Server {
                    id: SCRIPTED_SERVER_ID,
                    name: String::from("scripted"),
                    public_net: PublicNet {
                        ipv4: Some(Ipv4Assignment {
                            ip: SCRIPTED_SERVER_IP,
                        }),
                    },
                    rescue_enabled: false,
                },
                server_types,
                ssh_keys: BTreeMap::new(),
                images: Vec::new(),
                next_action_commands: Vec::new(),
                root_password: String::from("scripted-root-password"),
                failing_calls: BTreeSet::new(),
                failing_actions: BTreeSet::new(),
                next_action_id: 1,
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an SSH key reachable by its identifier and by its name.
    pub fn add_ssh_key(&self, key: SshKey) {
        let mut state = self.lock();
        state.ssh_keys.insert(key.id.to_string(), key.clone());
        if !key.name.is_empty() {
            state.ssh_keys.insert(key.name.clone(), key);
        }
    }

    /// Registers a server type.
    pub fn add_server_type(&self, server_type: ServerType) {
        self.lock()
            .server_types
            .insert(server_type.name.clone(), server_type);
    }

    /// Sets the images returned by every listing.
    pub fn set_images(&self, images: Vec<Image>) {
        self.lock().images = images;
    }

    /// Adds follow-up actions with the given commands to the create result.
    pub fn set_next_actions(&self, commands: &[&str]) {
        self.lock().next_action_commands = commands.iter().map(|&cmd| cmd.to_owned()).collect();
    }

    /// Overrides the rescue flag of the server the double hands out.
    pub fn set_rescue_enabled(&self, enabled: bool) {
        self.lock().server.rescue_enabled = enabled;
    }

    /// Overrides the root password returned when enabling rescue mode.
    pub fn set_root_password(&self, password: impl Into<String>) {
        self.lock().root_password = password.into();
    }

    /// Makes the given operation fail with an API error.
    pub fn fail_on(&self, operation: Operation) {
        self.lock().failing_calls.insert(operation);
    }

    /// Makes waits on actions with the given command fail.
    pub fn fail_action(&self, command: &str) {
        self.lock().failing_actions.insert(command.to_owned());
    }

    /// Returns the server the double creates.
    #[must_use]
    pub fn server(&self) -> Server {
        self.lock().server.clone()
    }

    /// Returns a snapshot of all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Returns the labels of all recorded calls in order.
    #[must_use]
    pub fn call_labels(&self) -> Vec<&'static str> {
        self.lock().calls.iter().map(ApiCall::label).collect()
    }

    /// Counts recorded calls with the given label.
    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.label() == label)
            .count()
    }

    /// Records `call` and fails when `operation` is scripted to fail.
    fn enter(&self, call: ApiCall, operation: Operation) -> Result<(), HcloudError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing_calls.contains(&operation) {
            return Err(HcloudError::Api {
                operation: "scripted call",
                status: 500,
                message: format!("scripted {operation:?} failure"),
            });
        }
        Ok(())
    }

    fn action(&self, command: &str) -> Action {
        let mut state = self.lock();
        let id = state.next_action_id;
        state.next_action_id += 1;
        Action {
            id,
            command: command.to_owned(),
            status: ActionStatus::Running,
            progress: 0,
            error: None,
        }
    }

    fn respond<T>(
        &self,
        call: ApiCall,
        operation: Operation,
        value: impl FnOnce() -> T,
    ) -> Result<T, HcloudError> {
        self.enter(call, operation)?;
        Ok(value())
    }

    fn observe_action(&self, action: &Action) -> Result<(), HcloudError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::WatchAction {
            id: action.id,
            command: action.command.clone(),
        });
        if state.failing_actions.contains(&action.command) {
            return Err(HcloudError::ActionFailed {
                id: action.id,
                command: action.command.clone(),
                code: String::from("scripted_failure"),
                message: String::from("scripted action failure"),
            });
        }
        Ok(())
    }
}

impl CloudApi for ScriptedApi {
    fn get_ssh_key<'a>(&'a self, id_or_name: &'a str) -> ApiFuture<'a, Option<SshKey>> {
        Box::pin(async move {
            self.respond(
                ApiCall::GetSshKey(id_or_name.to_owned()),
                Operation::GetSshKey,
                || self.lock().ssh_keys.get(id_or_name).cloned(),
            )
        })
    }

    fn get_server_type<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<ServerType>> {
        Box::pin(async move {
            self.respond(
                ApiCall::GetServerType(name.to_owned()),
                Operation::GetServerType,
                || self.lock().server_types.get(name).cloned(),
            )
        })
    }

    fn list_images<'a>(&'a self, opts: &'a ImageListOpts) -> ApiFuture<'a, Vec<Image>> {
        Box::pin(async move {
            self.respond(
                ApiCall::ListImages(opts.clone()),
                Operation::ListImages,
                || self.lock().images.clone(),
            )
        })
    }

    fn create_server<'a>(
        &'a self,
        opts: &'a ServerCreateOpts,
    ) -> ApiFuture<'a, ServerCreateResult> {
        Box::pin(async move {
            self.enter(ApiCall::CreateServer(opts.clone()), Operation::CreateServer)?;
            let action = self.action("create_server");
            let commands = self.lock().next_action_commands.clone();
            let next_actions = commands.iter().map(|command| self.action(command)).collect();
            let mut server = self.server();
            server.name.clone_from(&opts.name);
            Ok(ServerCreateResult {
                server,
                action,
                next_actions,
            })
        })
    }

    fn delete_server(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(async move {
            self.respond(ApiCall::DeleteServer(id), Operation::DeleteServer, || {
                self.action("delete_server")
            })
        })
    }

    fn change_server_type<'a>(
        &'a self,
        id: ServerId,
        opts: &'a ChangeTypeOpts,
    ) -> ApiFuture<'a, Action> {
        Box::pin(async move {
            self.respond(
                ApiCall::ChangeServerType {
                    id,
                    server_type: opts.server_type.clone(),
                    upgrade_disk: opts.upgrade_disk,
                },
                Operation::ChangeServerType,
                || self.action("change_server_type"),
            )
        })
    }

    fn power_on_server(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(async move {
            self.respond(ApiCall::PowerOnServer(id), Operation::PowerOnServer, || {
                self.action("start_server")
            })
        })
    }

    fn reset_server(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(async move {
            self.respond(ApiCall::ResetServer(id), Operation::ResetServer, || {
                self.action("reset_server")
            })
        })
    }

    fn enable_rescue<'a>(
        &'a self,
        id: ServerId,
        opts: &'a EnableRescueOpts,
    ) -> ApiFuture<'a, EnableRescueResult> {
        Box::pin(async move {
            self.enter(
                ApiCall::EnableRescue {
                    id,
                    rescue_type: opts.rescue_type.clone(),
                    ssh_key_ids: opts.ssh_keys.iter().map(|key| key.id).collect(),
                },
                Operation::EnableRescue,
            )?;
            let action = self.action("enable_rescue");
            let root_password = self.lock().root_password.clone();
            Ok(EnableRescueResult {
                action,
                root_password: Some(root_password),
            })
        })
    }

    fn disable_rescue(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(async move {
            self.respond(ApiCall::DisableRescue(id), Operation::DisableRescue, || {
                self.action("disable_rescue")
            })
        })
    }

    fn watch_action<'a>(&'a self, action: &'a Action) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.observe_action(action) })
    }
}

/// Builds an image for selection tests.
///
/// # Errors
///
/// Returns a [`ParseError`] when `created` is not an RFC 3339 timestamp.
pub fn image(id: i64, description: &str, created: &str) -> Result<Image, ParseError> {
    let created = DateTime::parse_from_rfc3339(created)?.with_timezone(&Utc);
    Ok(Image {
        id,
        description: description.to_owned(),
        created,
    })
}

/// One line captured by [`RecordingUi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UiEvent {
    /// A [`Ui::say`] line.
    Say(String),
    /// A [`Ui::message`] line.
    Message(String),
    /// A [`Ui::error`] line.
    Error(String),
}

/// [`Ui`] that records every line.
#[derive(Clone, Debug, Default)]
pub struct RecordingUi {
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl RecordingUi {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded lines.
    #[must_use]
    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded error lines.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Error(message) => Some(message),
                UiEvent::Say(_) | UiEvent::Message(_) => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Ui for RecordingUi {
    fn say(&self, message: &str) {
        self.push(UiEvent::Say(message.to_owned()));
    }

    fn message(&self, message: &str) {
        self.push(UiEvent::Message(message.to_owned()));
    }

    fn error(&self, message: &str) {
        self.push(UiEvent::Error(message.to_owned()));
    }
}
