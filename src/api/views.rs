//! Minimal HTML for the session presentations and both credential forms.
//!
//! Styling is out of scope; these are the smallest surfaces the gate can
//! protect. Everything user- or upstream-provided is escaped before it is
//! interpolated.

use crate::flow::feed::SessionState;
use crate::flow::form::FieldErrors;

/// Render the home surface for the current session state.
///
/// Loading renders a non-committal placeholder: it never claims the caller
/// is unauthenticated before a determination exists.
#[must_use]
pub fn home_page(state: &SessionState) -> String {
    match state {
        SessionState::Loading => page("Home", "<p>Loading…</p>"),
        SessionState::Authenticated(session) => {
            let body = format!(
                concat!(
                    "<p>Logged in as {name}</p>\n",
                    "<form method=\"post\" action=\"/v1/auth/sign-out\">\n",
                    "  <button type=\"submit\">Sign out</button>\n",
                    "</form>"
                ),
                name = escape(&session.user().name)
            );
            page("Home", &body)
        }
        SessionState::Unauthenticated => page(
            "Home",
            concat!(
                "<p><a href=\"/sign-in\">Sign in</a></p>\n",
                "<p><a href=\"/sign-up\">Create an account</a></p>"
            ),
        ),
    }
}

/// Render the sign-in surface, re-filling the email on a failed attempt.
#[must_use]
pub fn sign_in_page(error: Option<&str>, fields: &FieldErrors, email: &str) -> String {
    let body = format!(
        concat!(
            "<h1>Welcome back</h1>\n",
            "<p>Login to your account</p>\n",
            "{alert}",
            "<form method=\"post\" action=\"/v1/auth/sign-in\">\n",
            "  <label for=\"email\">Email</label>\n",
            "  <input id=\"email\" name=\"email\" type=\"email\" value=\"{email}\">\n",
            "{email_message}",
            "  <label for=\"password\">Password</label>\n",
            "  <input id=\"password\" name=\"password\" type=\"password\">\n",
            "{password_message}",
            "  <button type=\"submit\">Sign in</button>\n",
            "</form>\n",
            "<p>Or continue with</p>\n",
            "<p><a href=\"/v1/auth/social/google?callback=/\">Google</a>\n",
            "<a href=\"/v1/auth/social/github?callback=/\">GitHub</a></p>\n",
            "<p>Don't have an account? <a href=\"/sign-up\">Sign up</a></p>"
        ),
        alert = alert(error),
        email = escape(email),
        email_message = field_message(fields.email),
        password_message = field_message(fields.password),
    );
    page("Sign in", &body)
}

/// Render the sign-up surface, re-filling name and email on a failed
/// attempt. The password is never echoed back.
#[must_use]
pub fn sign_up_page(error: Option<&str>, fields: &FieldErrors, name: &str, email: &str) -> String {
    let body = format!(
        concat!(
            "<h1>Create your account</h1>\n",
            "{alert}",
            "<form method=\"post\" action=\"/v1/auth/sign-up\">\n",
            "  <label for=\"name\">Name</label>\n",
            "  <input id=\"name\" name=\"name\" value=\"{name}\">\n",
            "{name_message}",
            "  <label for=\"email\">Email</label>\n",
            "  <input id=\"email\" name=\"email\" type=\"email\" value=\"{email}\">\n",
            "{email_message}",
            "  <label for=\"password\">Password</label>\n",
            "  <input id=\"password\" name=\"password\" type=\"password\">\n",
            "{password_message}",
            "  <button type=\"submit\">Create account</button>\n",
            "</form>\n",
            "<p>Already have an account? <a href=\"/sign-in\">Sign in</a></p>"
        ),
        alert = alert(error),
        name = escape(name),
        email = escape(email),
        name_message = field_message(fields.name),
        email_message = field_message(fields.email),
        password_message = field_message(fields.password),
    );
    page("Sign up", &body)
}

fn page(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!doctype html>\n",
            "<html lang=\"en\">\n",
            "<head><meta charset=\"utf-8\"><title>{title}</title></head>\n",
            "<body>\n{body}\n</body>\n",
            "</html>\n"
        ),
        title = escape(title),
        body = body,
    )
}

fn alert(error: Option<&str>) -> String {
    error.map_or_else(String::new, |message| {
        format!("<p role=\"alert\">{}</p>\n", escape(message))
    })
}

fn field_message(message: Option<&'static str>) -> String {
    message.map_or_else(String::new, |text| {
        format!("  <span class=\"field-error\">{}</span>\n", escape(text))
    })
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
