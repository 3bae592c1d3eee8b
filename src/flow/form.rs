//! Credential form controller: one state machine per rendered form.
//!
//! The machine is split into a synchronous core (`begin_submit`,
//! `begin_social`, `resolve`) and async drivers (`submit`, `submit_social`)
//! that hold the single await point against the bridge, so every transition
//! is testable without scheduling.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{error, warn};

use crate::flow::bridge::{
    AuthError, AuthRequest, AuthResult, Credentials, IdentityBridge, Provider, SocialRedirect,
};
use crate::flow::gate::{HOME_PATH, SIGN_IN_PATH};
use crate::flow::session::Session;

const EMAIL_REQUIRED: &str = "Enter a valid email address";
const PASSWORD_REQUIRED: &str = "Password is required";
const NAME_REQUIRED: &str = "Name is required";

/// Which form this controller backs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    SignIn,
    SignUp,
}

impl FormKind {
    /// Post-auth destination. Registration does not auto-authenticate, so
    /// the sign-up form lands on the sign-in surface.
    #[must_use]
    pub fn destination(self) -> &'static str {
        match self {
            FormKind::SignIn => HOME_PATH,
            FormKind::SignUp => SIGN_IN_PATH,
        }
    }
}

/// Submission lifecycle. No state is terminal; the form is reusable across
/// attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Validating,
    Pending,
    Succeeded,
    Failed,
}

/// Per-field validation messages. Populated only by a failed local
/// validation pass, never by the bridge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
    pub name: Option<&'static str>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.name.is_none()
    }
}

/// Why a submit attempt produced no request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// A request is already outstanding; the attempt is dropped, not queued.
    InFlight,
    /// Local validation failed; field messages are attached to the form.
    Invalid,
}

/// Where the caller goes after a resolved submission.
#[derive(Debug)]
pub enum Resolution {
    /// Navigate exactly once to `target`. Carries the session the bridge
    /// returned; the sign-up path ignores it.
    Redirect {
        target: &'static str,
        session: Session,
    },
    /// Stay on the form; the error slot holds the latest failure and the
    /// submit control is enabled again.
    Stay,
}

/// State machine backing one credential form instance.
pub struct CredentialForm {
    kind: FormKind,
    email: String,
    password: SecretString,
    name: String,
    status: FormStatus,
    error: Option<String>,
    field_errors: FieldErrors,
}

impl CredentialForm {
    #[must_use]
    pub fn sign_in() -> Self {
        Self::new(FormKind::SignIn)
    }

    #[must_use]
    pub fn sign_up() -> Self {
        Self::new(FormKind::SignUp)
    }

    fn new(kind: FormKind) -> Self {
        Self {
            kind,
            email: String::new(),
            password: SecretString::default(),
            name: String::new(),
            status: FormStatus::Idle,
            error: None,
            field_errors: FieldErrors::default(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FormKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> FormStatus {
        self.status
    }

    /// Whether a request is outstanding; the submit control is disabled
    /// exactly while this holds.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == FormStatus::Pending
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field edits never validate and never change the status; inputs stay
    /// editable even while a submission is pending.
    pub fn set_email(&mut self, value: &str) {
        self.email = value.to_string();
    }

    pub fn set_password(&mut self, value: SecretString) {
        self.password = value;
    }

    pub fn set_name(&mut self, value: &str) {
        self.name = value.to_string();
    }

    /// Validate the current values and, if they pass, move to `Pending` and
    /// produce the one request this attempt is allowed to dispatch.
    ///
    /// # Errors
    ///
    /// `InFlight` while a request is outstanding (the attempt is dropped);
    /// `Invalid` when validation failed and field messages were attached.
    pub fn begin_submit(&mut self) -> Result<AuthRequest, SubmitBlocked> {
        if self.is_pending() {
            return Err(SubmitBlocked::InFlight);
        }

        // Every attempt starts clean: the previous error is discarded here,
        // not when the next result arrives.
        self.status = FormStatus::Validating;
        self.error = None;
        self.field_errors = FieldErrors::default();

        let email = normalize_email(&self.email);
        let mut field_errors = FieldErrors::default();
        if !valid_email(&email) {
            field_errors.email = Some(EMAIL_REQUIRED);
        }
        if self.password.expose_secret().is_empty() {
            field_errors.password = Some(PASSWORD_REQUIRED);
        }
        if self.kind == FormKind::SignUp && self.name.trim().is_empty() {
            field_errors.name = Some(NAME_REQUIRED);
        }
        if !field_errors.is_empty() {
            self.field_errors = field_errors;
            self.status = FormStatus::Idle;
            return Err(SubmitBlocked::Invalid);
        }

        self.status = FormStatus::Pending;
        Ok(AuthRequest::EmailPassword(Credentials {
            email,
            password: self.password.clone(),
            name: (self.kind == FormKind::SignUp).then(|| self.name.trim().to_string()),
        }))
    }

    /// Start a provider-redirect flow on this form. Shares the pending flag
    /// with email/password submission: the two are mutually exclusive.
    ///
    /// # Errors
    ///
    /// `InFlight` while any request is outstanding.
    pub fn begin_social(
        &mut self,
        provider: Provider,
        callback: &str,
    ) -> Result<AuthRequest, SubmitBlocked> {
        if self.is_pending() {
            return Err(SubmitBlocked::InFlight);
        }

        self.error = None;
        self.field_errors = FieldErrors::default();
        self.status = FormStatus::Pending;
        Ok(AuthRequest::Social {
            provider,
            callback: callback.to_string(),
        })
    }

    /// Consume the result of the outstanding request.
    pub fn resolve(&mut self, result: AuthResult) -> Resolution {
        match result {
            Ok(session) => {
                self.status = FormStatus::Succeeded;
                Resolution::Redirect {
                    target: self.kind.destination(),
                    session,
                }
            }
            Err(err) => {
                // Rejections are user-recoverable; outages are not ours but
                // must not be silent.
                match &err {
                    AuthError::Rejected(message) => warn!("Authentication rejected: {message}"),
                    AuthError::Unavailable(_) => error!("Authentication failed: {err}"),
                }
                self.error = Some(err.message().to_string());
                self.status = FormStatus::Failed;
                Resolution::Stay
            }
        }
    }

    /// A failed social handoff is the only social outcome observable here;
    /// success navigates away.
    pub fn resolve_social_failure(&mut self, err: AuthError) {
        match &err {
            AuthError::Rejected(message) => warn!("Social sign-in rejected: {message}"),
            AuthError::Unavailable(_) => error!("Social sign-in failed: {err}"),
        }
        self.error = Some(err.message().to_string());
        self.status = FormStatus::Failed;
    }

    /// Drive one email/password submission end to end. The bridge call is
    /// bounded by `timeout`; expiry resolves the attempt as an
    /// infrastructure failure instead of leaving the form pending forever.
    ///
    /// # Errors
    ///
    /// Passes through [`SubmitBlocked`] from [`Self::begin_submit`]; bridge
    /// failures are not errors here, they resolve to [`Resolution::Stay`].
    pub async fn submit<B>(
        &mut self,
        bridge: &B,
        timeout: Duration,
    ) -> Result<Resolution, SubmitBlocked>
    where
        B: IdentityBridge + ?Sized,
    {
        let request = self.begin_submit()?;
        let AuthRequest::EmailPassword(credentials) = request else {
            // begin_submit only ever produces email/password requests
            return Err(SubmitBlocked::Invalid);
        };

        let kind = self.kind;
        let call = async {
            match kind {
                FormKind::SignIn => {
                    bridge
                        .sign_in(&credentials.email, &credentials.password)
                        .await
                }
                FormKind::SignUp => {
                    bridge
                        .sign_up(
                            &credentials.email,
                            &credentials.password,
                            credentials.name.as_deref().unwrap_or_default(),
                        )
                        .await
                }
            }
        };
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::Unavailable(format!(
                "no response from identity provider within {}s",
                timeout.as_secs()
            ))),
        };

        Ok(self.resolve(result))
    }

    /// Drive one social handoff. `Some(redirect)` means the caller must
    /// navigate to the provider; `None` means the failure is on the form.
    ///
    /// # Errors
    ///
    /// Passes through [`SubmitBlocked::InFlight`] from
    /// [`Self::begin_social`].
    pub async fn submit_social<B>(
        &mut self,
        bridge: &B,
        provider: Provider,
        callback: &str,
        timeout: Duration,
    ) -> Result<Option<SocialRedirect>, SubmitBlocked>
    where
        B: IdentityBridge + ?Sized,
    {
        let request = self.begin_social(provider, callback)?;
        let AuthRequest::Social { provider, callback } = request else {
            return Err(SubmitBlocked::InFlight);
        };

        let call = bridge.sign_in_social(&provider, &callback);
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::Unavailable(format!(
                "no response from identity provider within {}s",
                timeout.as_secs()
            ))),
        };

        match result {
            Ok(redirect) => {
                // Success performs a full navigation away; locally the
                // pending flag is simply cleared.
                self.status = FormStatus::Idle;
                Ok(Some(redirect))
            }
            Err(err) => {
                self.resolve_social_failure(err);
                Ok(None)
            }
        }
    }
}

/// Normalize an email for validation and submission.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}
