use std::io::{self, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::json;
use time::OffsetDateTime;

use crate::core::config::BaasSettings;
use crate::schemas::parse::LoginResponse;
use crate::services::parse_client::{Credentials, ParseApiError, ParseClient, RawResponse};

const BODY_PREVIEW_CHARS: usize = 1000;
const PASSWORD_BYTES: usize = 24;

/// What one smoke step observed; `status` is `None` when no reply arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SmokeStep {
    pub(crate) name: &'static str,
    pub(crate) status: Option<u16>,
}

pub(crate) fn throwaway_username(unix_timestamp: i64) -> String {
    format!("test_user_{unix_timestamp}")
}

pub(crate) fn generate_password() -> String {
    let mut bytes = [0u8; PASSWORD_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Exercises the Parse auth paths: function calls under each key, sign-up,
/// login, session-scoped functions and cleanup of the throwaway user.
pub(crate) struct AuthSmoke<'a, W: Write> {
    client: &'a ParseClient,
    rest: Option<Credentials>,
    master: Option<Credentials>,
    out: &'a mut W,
    steps: Vec<SmokeStep>,
}

impl<'a, W: Write> AuthSmoke<'a, W> {
    pub(crate) fn new(client: &'a ParseClient, settings: &BaasSettings, out: &'a mut W) -> Self {
        let rest = (!settings.rest_api_key.is_empty())
            .then(|| Credentials::RestKey(settings.rest_api_key.clone()));
        let master = (!settings.master_key.is_empty())
            .then(|| Credentials::MasterKey(settings.master_key.clone()));
        Self { client, rest, master, out, steps: Vec::new() }
    }

    pub(crate) async fn run(
        mut self,
        settings: &BaasSettings,
        username: &str,
        password: &str,
    ) -> io::Result<Vec<SmokeStep>> {
        writeln!(self.out, "APP_ID present: {}", !settings.app_id.is_empty())?;
        writeln!(self.out, "REST_API_KEY present: {}", self.rest.is_some())?;
        writeln!(self.out, "MASTER_KEY present: {}", self.master.is_some())?;
        writeln!(self.out, "SERVER: {}", settings.api_base())?;

        let empty = json!({});
        match self.rest.clone() {
            Some(rest) => {
                writeln!(self.out, "\n==> Calling getCourseCompletion with X-Parse-REST-API-Key")?;
                let result =
                    self.client.call_function_raw("getCourseCompletion", &rest, &empty).await;
                self.record("getCourseCompletion (REST key)", result)?;
            }
            None => writeln!(self.out, "\n==> Skipping REST key call: no REST key configured")?,
        }
        match self.master.clone() {
            Some(master) => {
                writeln!(self.out, "\n==> Calling getCourseCompletion with X-Parse-Master-Key")?;
                let result =
                    self.client.call_function_raw("getCourseCompletion", &master, &empty).await;
                self.record("getCourseCompletion (master key)", result)?;
            }
            None => writeln!(self.out, "\n==> Skipping master key call: no master key configured")?,
        }

        let Some(creator) = self.master.clone().or_else(|| self.rest.clone()) else {
            writeln!(self.out, "\nNo key configured; cannot create a test user")?;
            return Ok(self.steps);
        };

        writeln!(self.out, "\n==> Creating user {username}")?;
        let created = self.client.sign_up(&creator, username, password).await;
        self.record("create user", created)?;

        writeln!(self.out, "\n==> Login")?;
        let login = self.client.login(username, password).await;
        let session = match &login {
            Ok(response) => response.decode::<LoginResponse>().ok(),
            Err(_) => None,
        };
        self.record("login", login)?;

        let Some(session) = session else {
            writeln!(self.out, "No session token; skipping session steps")?;
            return Ok(self.steps);
        };

        let session_credentials = Credentials::SessionToken(session.session_token.clone());
        writeln!(self.out, "\n==> Calling createTodo")?;
        let created_todo = self
            .client
            .call_function_raw(
                "createTodo",
                &session_credentials,
                &json!({ "title": "Test todo via auth smoke" }),
            )
            .await;
        self.record("createTodo", created_todo)?;

        writeln!(self.out, "\n==> Calling getTodos")?;
        let todos = self.client.call_function_raw("getTodos", &session_credentials, &empty).await;
        self.record("getTodos", todos)?;

        match self.master.clone() {
            Some(master) => {
                writeln!(self.out, "\n==> Deleting test user {}", session.object_id)?;
                let deleted = self.client.delete_user(&master, &session.object_id).await;
                self.record("delete user", deleted)?;
            }
            None => writeln!(
                self.out,
                "\nNo master key; test user {} was not deleted",
                session.object_id
            )?,
        }

        Ok(self.steps)
    }

    fn record(
        &mut self,
        name: &'static str,
        result: Result<RawResponse, ParseApiError>,
    ) -> io::Result<()> {
        match result {
            Ok(response) => {
                let status = response.status.as_u16();
                writeln!(self.out, "{name} status {status}")?;
                writeln!(self.out, "{}", response.body_preview(BODY_PREVIEW_CHARS))?;
                if !response.status.is_success() {
                    tracing::warn!(step = name, status, "Smoke step rejected");
                }
                self.steps.push(SmokeStep { name, status: Some(status) });
            }
            Err(err) => {
                writeln!(self.out, "✗ {name}: {err}")?;
                tracing::error!(step = name, error = %err, "Smoke step failed");
                self.steps.push(SmokeStep { name, status: None });
            }
        }
        Ok(())
    }
}

/// Runs the smoke flow with a fresh throwaway account.
pub(crate) async fn run<W: Write>(
    client: &ParseClient,
    settings: &BaasSettings,
    out: &mut W,
) -> io::Result<Vec<SmokeStep>> {
    let username = throwaway_username(OffsetDateTime::now_utc().unix_timestamp());
    let password = generate_password();
    AuthSmoke::new(client, settings, out).run(settings, &username, &password).await
}
