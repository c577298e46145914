/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command-line host for the console.
//!
//! Each command runs on a current-thread tokio runtime: the session store is
//! restored from the saved token, the route guard is consulted exactly as it
//! would be for an interactive navigation, and wizard effects are executed
//! by [`WizardDriver`].

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use agriregistry_comms::RegistryClient;
use agriregistry_core::{
    AddressSection, ApiError, DocumentKind, FarmPatch, FarmSection, OperatorApi, PersonalPatch,
    PersonalSection, UploadFile,
};
use bpaf::Bpaf;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::prefs::{ConsolePrefs, ENV_KEYS, PrefsError};
use crate::runtime::diagnostics::{
    CHANNEL_STARTUP_CONFIG_SNAPSHOT, DiagnosticsState, emit_signal, install_global_sender,
};
use crate::shell::nav_shell::{self, NavShellView};
use crate::shell::operator_form::{self, OperatorForm};
use crate::shell::route_guard::{GuardOutcome, resolve_final};
use crate::shell::routes::Route;
use crate::shell::session_store::SessionStore;
use crate::shell::token_vault::{TokenSecret, TokenVault};
use crate::wizard::WizardIntent;
use crate::wizard::driver::WizardDriver;
use crate::wizard::steps::ActivePanel;

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
/// Farmer registry console
struct Cli {
    /// Preferences file (TOML)
    #[bpaf(long, argument("PATH"))]
    config: Option<PathBuf>,
    /// Registry API base URL
    #[bpaf(long("api-url"), argument("URL"))]
    api_url: Option<String>,
    /// Log filter, e.g. "info" or "agriregistry=debug"
    #[bpaf(long, argument("FILTER"))]
    log: Option<String>,
    /// Print diagnostic channel counts on exit
    #[bpaf(long)]
    diagnostics: bool,
    #[bpaf(external(command))]
    command: Command,
}

#[derive(Debug, Clone, Bpaf)]
enum Command {
    /// Sign in and save the session token
    #[bpaf(command)]
    Login {
        #[bpaf(long, argument("EMAIL"))]
        email: String,
        #[bpaf(long, argument("PASSWORD"))]
        password: String,
    },
    /// Forget the saved session
    #[bpaf(command)]
    Logout,
    /// Show the signed-in user
    #[bpaf(command)]
    Whoami,
    /// Render the navigation shell for a path
    #[bpaf(command)]
    Nav {
        #[bpaf(long, argument("PATH"), fallback("/".to_string()))]
        path: String,
    },
    /// Resolve a path through the route guards
    #[bpaf(command)]
    Route {
        #[bpaf(positional("PATH"))]
        path: String,
    },
    /// Register a farmer from a draft file
    #[bpaf(command)]
    Register {
        #[bpaf(long, argument("FILE"))]
        draft: PathBuf,
        #[bpaf(long, argument("PATH"))]
        photo: Option<PathBuf>,
        /// Supporting document, e.g. nrc=scan.pdf (repeatable)
        #[bpaf(long, argument("KIND=PATH"), many)]
        document: Vec<String>,
    },
    /// Manage operator accounts (admin only)
    #[bpaf(command)]
    Operators {
        #[bpaf(external(operators_action))]
        action: OperatorsAction,
    },
}

#[derive(Debug, Clone, Bpaf)]
enum OperatorsAction {
    #[bpaf(command)]
    List,
    #[bpaf(command)]
    Create {
        #[bpaf(long("first-name"), argument("NAME"))]
        first_name: String,
        #[bpaf(long("last-name"), argument("NAME"))]
        last_name: String,
        #[bpaf(long, argument("EMAIL"))]
        email: String,
        #[bpaf(long, argument("PASSWORD"))]
        password: String,
        #[bpaf(long("confirm-password"), argument("PASSWORD"))]
        confirm_password: String,
        #[bpaf(long, argument("PHONE"), fallback(String::new()))]
        phone: String,
        #[bpaf(long, argument("CODE"), fallback(String::new()))]
        province: String,
        #[bpaf(long, argument("CODE"), fallback(String::new()))]
        district: String,
    },
    #[bpaf(command)]
    Activate {
        #[bpaf(long, argument("ID"))]
        id: String,
    },
    #[bpaf(command)]
    Deactivate {
        #[bpaf(long, argument("ID"))]
        id: String,
    },
}

#[derive(Debug)]
enum CliError {
    Prefs(PrefsError),
    Api(ApiError),
    Runtime(io::Error),
    Read { path: PathBuf, source: io::Error },
    Draft { path: PathBuf, source: toml::de::Error },
    BadDocument(String),
    NotSignedIn,
    Denied(Route),
    Rejected(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefs(e) => write!(f, "{e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "failed to start async runtime: {e}"),
            Self::Read { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Draft { path, source } => write!(f, "invalid draft {}: {source}", path.display()),
            Self::BadDocument(raw) => write!(f, "expected KIND=PATH, got '{raw}'"),
            Self::NotSignedIn => f.write_str("not signed in; run `agriregistry login` first"),
            Self::Denied(route) => write!(f, "{route} is not available to this account"),
            Self::Rejected(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Prefs(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Runtime(e) => Some(e),
            Self::Read { source, .. } => Some(source),
            Self::Draft { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PrefsError> for CliError {
    fn from(e: PrefsError) -> Self {
        Self::Prefs(e)
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

/// Draft file accepted by `register`. Address levels are given by code; the
/// names are resolved from the geo service the same way the form does it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DraftFile {
    personal: PersonalSection,
    address: AddressSection,
    farm: FarmSection,
}

#[cfg(feature = "tracing")]
fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = filter
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .is_ok()
    {
        tracing::debug!("tracing subscriber installed");
    }
}

#[cfg(not(feature = "tracing"))]
fn init_tracing(_filter: Option<&str>) {}

/// Record which `AGRIREGISTRY_*` variables shaped this run.
fn log_startup_snapshot(prefs: &ConsolePrefs) {
    let present: Vec<&str> = ENV_KEYS
        .iter()
        .copied()
        .filter(|key| std::env::var_os(key).is_some())
        .collect();
    info!(
        "startup: api={} timeout={}s persist_session={} env=[{}]",
        prefs.api_url,
        prefs.timeout_secs,
        prefs.persist_session,
        present.join(", ")
    );
    emit_signal(CHANNEL_STARTUP_CONFIG_SNAPSHOT, 0);
}

fn load_prefs(cli: &Cli) -> Result<ConsolePrefs, CliError> {
    let mut prefs = ConsolePrefs::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        prefs.api_url = url.trim().to_string();
    }
    if let Some(filter) = &cli.log {
        prefs.log_filter = Some(filter.clone());
    }
    prefs.validate()?;
    Ok(prefs)
}

pub fn main() -> ExitCode {
    let cli = cli().run();
    let prefs = match load_prefs(&cli) {
        Ok(prefs) => prefs,
        Err(error) => {
            eprintln!("agriregistry: {error}");
            return ExitCode::FAILURE;
        },
    };
    init_tracing(prefs.log_filter.as_deref());

    let mut diagnostics = cli.diagnostics.then(DiagnosticsState::new);
    if let Some(state) = &diagnostics {
        install_global_sender(state.sender());
    }
    log_startup_snapshot(&prefs);

    let outcome = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
        .and_then(|runtime| runtime.block_on(run(cli.command, &prefs)));

    if let Some(state) = diagnostics.as_mut() {
        state.drain();
        match serde_json::to_string_pretty(&state.snapshot_json()) {
            Ok(json) => eprintln!("{json}"),
            Err(error) => warn!("diagnostics snapshot failed: {error}"),
        }
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("agriregistry: {error}");
            ExitCode::FAILURE
        },
    }
}

async fn run(command: Command, prefs: &ConsolePrefs) -> Result<(), CliError> {
    let api = RegistryClient::new(&prefs.api_url, prefs.timeout())?;
    let store = match prefs.session_path() {
        Some(path) => SessionStore::with_vault(TokenVault::new(
            path,
            TokenSecret::keychain(&prefs.api_url),
        )),
        None => SessionStore::in_memory(),
    };

    match command {
        Command::Login { email, password } => {
            if !store.login(&api, &email, &password).await {
                let message = store.snapshot().last_error.unwrap_or_default();
                return Err(CliError::Rejected(message));
            }
            println!("signed in; landing page {}", store.landing_route());
            Ok(())
        },
        Command::Logout => {
            let route = nav_shell::logout(&store, &api);
            println!("signed out; next page {route}");
            Ok(())
        },
        Command::Whoami => {
            restore(&store, &api).await?;
            let snapshot = store.snapshot();
            let Some(user) = snapshot.user() else {
                return Err(CliError::NotSignedIn);
            };
            let roles: Vec<&str> = user.roles.iter().map(|role| role.as_str()).collect();
            println!("{} <{}>", user.display_name, user.email.as_deref().unwrap_or("-"));
            println!("roles: {}", roles.join(", "));
            Ok(())
        },
        Command::Nav { path } => {
            restore(&store, &api).await?;
            let resolution = resolve_final(&path, &store.snapshot());
            let landed = resolution.landed().path();
            let view = NavShellView::build(&store.snapshot().session, &landed);
            print_nav(&view, &landed);
            Ok(())
        },
        Command::Route { path } => {
            store.restore(&api).await;
            let resolution = resolve_final(&path, &store.snapshot());
            for hop in &resolution.hops {
                println!("-> {hop}");
            }
            match resolution.outcome {
                GuardOutcome::Render => println!("render {}", resolution.landed()),
                GuardOutcome::Waiting => println!("waiting on session"),
                GuardOutcome::Redirect { to, .. } => println!("redirect loop stopped at {to}"),
            }
            Ok(())
        },
        Command::Register {
            draft,
            photo,
            document,
        } => {
            restore(&store, &api).await?;
            require_route(&store, Route::FarmerCreate)?;
            register(&api, &draft, photo.as_deref(), &document).await
        },
        Command::Operators { action } => {
            restore(&store, &api).await?;
            require_route(&store, Route::OperatorsManage)?;
            operators(&api, action).await
        },
    }
}

async fn restore(store: &SessionStore, api: &RegistryClient) -> Result<(), CliError> {
    if store.restore(api).await {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}

fn require_route(store: &SessionStore, route: Route) -> Result<(), CliError> {
    let resolution = resolve_final(&route.path(), &store.snapshot());
    if resolution.outcome == GuardOutcome::Render && resolution.landed() == &route {
        Ok(())
    } else {
        Err(CliError::Denied(route))
    }
}

fn print_nav(view: &NavShellView, path: &str) {
    println!("{} [{}]", view.page_title, path);
    println!("{} ({}) {} @ {}", view.initials, view.role_label, view.user_name, view.crumb);
    for group in &view.groups {
        println!("{}", group.title);
        for link in &group.links {
            let marker = if link.active { '*' } else { ' ' };
            match link.badge {
                Some(badge) => println!(" {marker} {} [{badge}]  {}", link.label, link.target),
                None => println!(" {marker} {}  {}", link.label, link.target),
            }
        }
    }
}

fn read_upload(path: &Path) -> Result<UploadFile, CliError> {
    let bytes = fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(UploadFile {
        file_name,
        mime: mime.essence_str().to_string(),
        bytes,
    })
}

fn parse_document(raw: &str) -> Result<(DocumentKind, PathBuf), CliError> {
    let (kind, path) = raw
        .split_once('=')
        .ok_or_else(|| CliError::BadDocument(raw.to_string()))?;
    let kind = DocumentKind::parse(kind).ok_or_else(|| CliError::BadDocument(raw.to_string()))?;
    if path.trim().is_empty() {
        return Err(CliError::BadDocument(raw.to_string()));
    }
    Ok((kind, PathBuf::from(path.trim())))
}

/// Surface the inline error of the active panel, if any.
fn check_panel(driver: &WizardDriver<'_, RegistryClient>) -> Result<(), CliError> {
    match driver.wizard().panel().error() {
        Some(message) => Err(CliError::Rejected(message.to_string())),
        None => Ok(()),
    }
}

async fn register(
    api: &RegistryClient,
    draft_path: &Path,
    photo: Option<&Path>,
    documents: &[String],
) -> Result<(), CliError> {
    let raw = fs::read_to_string(draft_path).map_err(|source| CliError::Read {
        path: draft_path.to_path_buf(),
        source,
    })?;
    let draft: DraftFile = toml::from_str(&raw).map_err(|source| CliError::Draft {
        path: draft_path.to_path_buf(),
        source,
    })?;
    let documents = documents
        .iter()
        .map(|raw| parse_document(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut driver = WizardDriver::new(api);
    info!("registration flow {} started", driver.wizard().flow_id());

    driver
        .dispatch([
            WizardIntent::EditPersonal(PersonalPatch::from(&draft.personal)),
            WizardIntent::Next,
        ])
        .await;
    check_panel(&driver)?;

    let address = &draft.address;
    driver
        .dispatch([WizardIntent::SelectProvince(address.province_code.clone())])
        .await;
    driver
        .dispatch([WizardIntent::SelectDistrict(address.district_code.clone())])
        .await;
    driver
        .dispatch([
            WizardIntent::SelectChiefdom(address.chiefdom_code.clone()),
            WizardIntent::SetVillage(address.village.clone()),
            WizardIntent::Next,
        ])
        .await;
    check_panel(&driver)?;

    driver
        .dispatch([
            WizardIntent::EditFarm(FarmPatch::from(&draft.farm)),
            WizardIntent::Next,
        ])
        .await;
    if let ActivePanel::Preview(preview) = driver.wizard().panel() {
        for row in &preview.rows {
            println!("{:>16}: {}", row.label, row.value);
        }
    }
    driver.dispatch([WizardIntent::Submit]).await;
    check_panel(&driver)?;

    let Some(created) = driver.wizard().created().cloned() else {
        return Err(CliError::Rejected("farmer was not created".to_string()));
    };
    println!("created {} ({})", created.farmer_id, created.display_name);

    if let Some(path) = photo {
        let file = read_upload(path)?;
        driver.dispatch([WizardIntent::UploadPhoto(file)]).await;
        check_panel(&driver)?;
        println!("photo uploaded: {}", path.display());
    }
    driver.dispatch([WizardIntent::Next]).await;

    for (kind, path) in documents {
        let file = read_upload(&path)?;
        driver
            .dispatch([WizardIntent::UploadDocument { kind: kind.clone(), file }])
            .await;
        check_panel(&driver)?;
        println!("{kind} uploaded: {}", path.display());
    }
    driver.dispatch([WizardIntent::Finish]).await;

    let wizard = driver.into_wizard();
    match wizard.panel() {
        ActivePanel::Completion(done) => {
            println!("profile: {}", done.profile_link);
            println!("register another: {}", done.register_another_link);
            Ok(())
        },
        other => {
            debug!("flow {} ended on {:?}", wizard.flow_id(), wizard.step());
            Err(CliError::Rejected(
                other
                    .error()
                    .unwrap_or("registration did not complete")
                    .to_string(),
            ))
        },
    }
}

async fn operators<A: OperatorApi>(api: &A, action: OperatorsAction) -> Result<(), CliError> {
    match action {
        OperatorsAction::List => {
            for operator in api.list_operators().await? {
                let state = if operator.is_active { "active" } else { "inactive" };
                println!("{}  {} <{}>  {state}", operator.id, operator.display_name, operator.email);
            }
            Ok(())
        },
        OperatorsAction::Create {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            phone,
            province,
            district,
        } => {
            let form = OperatorForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                phone,
                assigned_province: province,
                assigned_district: district,
            };
            let next = operator_form::create_operator(api, &form)
                .await
                .map_err(CliError::Rejected)?;
            println!("operator created; next page {next}");
            Ok(())
        },
        OperatorsAction::Activate { id } => {
            operator_form::set_operator_active(api, &id, true)
                .await
                .map_err(CliError::Rejected)?;
            println!("operator {id} activated");
            Ok(())
        },
        OperatorsAction::Deactivate { id } => {
            operator_form::set_operator_active(api, &id, false)
                .await
                .map_err(CliError::Rejected)?;
            println!("operator {id} deactivated");
            Ok(())
        },
    }
}
