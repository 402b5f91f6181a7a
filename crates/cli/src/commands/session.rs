//! Session commands: login, logout, extend, status, watch.

use shopfront_client::api::Credentials;
use shopfront_client::session::SessionEvent;

use super::{AppContext, CliError, render_event};

/// Sign in and persist the session.
#[allow(clippy::print_stdout)]
pub async fn login(ctx: &AppContext, login: &str, password: &str) -> Result<(), CliError> {
    let credentials = Credentials::new(login, password);
    ctx.session.sign_in(&credentials).await?;

    let expires_in = ctx
        .session
        .session_expired_delay_ms()
        .map_or_else(|| "unknown".to_owned(), |ms| format!("{}s", ms / 1000));
    println!("Signed in as {login} (session expires in {expires_in})");
    Ok(())
}

/// Clear the persisted session.
#[allow(clippy::print_stdout)]
pub fn logout(ctx: &AppContext) {
    ctx.session.logout();
    println!("Signed out.");
}

/// Exchange the refresh token for a fresh session.
///
/// Outcome arrives as a notice on the event channel, which the caller
/// drains after the command.
pub async fn extend(ctx: &AppContext) {
    ctx.session.extend_session().await;
}

/// Show the current session state.
#[allow(clippy::print_stdout)]
pub fn status(ctx: &AppContext) {
    if ctx.session.is_user_signed_in() {
        let login = ctx.session.current_login().unwrap_or_default();
        let roles: Vec<String> = ctx
            .session
            .roles()
            .iter()
            .map(ToString::to_string)
            .collect();
        let expires_in = ctx
            .session
            .session_expired_delay_ms()
            .map_or(0, |ms| ms / 1000);

        let locale = ctx.session.locale().unwrap_or(ctx.default_locale);

        println!("Signed in as {login}");
        println!("  roles:      {}", roles.join(", "));
        println!("  expires in: {expires_in}s");
        println!("  locale:     {locale}");
    } else if ctx.session.current_login().is_some() {
        println!("Session expired; run `shop-cli session login` to sign in again.");
    } else {
        println!("Not signed in.");
    }
    println!("Cart items: {}", ctx.cart.total_quantity());
}

/// Stay running and render session prompts as they fire.
///
/// This is the long-lived consumer the prompts were designed for: the
/// expired watcher and extend offer are armed, then events are rendered
/// until the session ends. With `auto_extend` the extend offer is
/// accepted silently instead of being shown.
#[allow(clippy::print_stdout)]
pub async fn watch(ctx: &mut AppContext, auto_extend: bool) -> Result<(), CliError> {
    if !ctx.session.is_user_signed_in() {
        return Err(CliError::NotSignedIn);
    }

    ctx.session.schedule_expired_prompt();
    ctx.session.schedule_extend_prompt();
    println!("Watching session (ctrl-c to stop)...");

    while let Some(event) = ctx.next_event().await {
        match event {
            SessionEvent::ExtendOffered if auto_extend => {
                ctx.session.extend_session().await;
            }
            SessionEvent::SessionExpired => {
                render_event(&SessionEvent::SessionExpired);
                break;
            }
            other => render_event(&other),
        }
    }
    Ok(())
}
