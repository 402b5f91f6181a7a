//! Account self-service commands.

use secrecy::SecretString;

use shopfront_client::api::{ChangePasswordInput, EditAccountInput, RegisterInput};
use shopfront_core::{Email, Locale};

use super::{AppContext, CliError};

/// Show the signed-in account.
#[allow(clippy::print_stdout)]
pub async fn show(ctx: &AppContext) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    let account = ctx.api.account(&token).await?;

    println!("Account #{} ({})", account.id, account.login);
    println!("  email:  {}", account.email);
    if let (Some(first), Some(last)) = (&account.first_name, &account.last_name) {
        println!("  name:   {first} {last}");
    }
    println!("  locale: {}", account.locale);
    println!("  state:  {:?}", account.state);
    Ok(())
}

/// Update first and last name.
#[allow(clippy::print_stdout)]
pub async fn edit(
    ctx: &AppContext,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<(), CliError> {
    if first_name.is_none() && last_name.is_none() {
        return Err(CliError::InvalidInput(
            "nothing to change; pass --first-name and/or --last-name".to_owned(),
        ));
    }

    let token = ctx.bearer_token()?;
    let input = EditAccountInput {
        first_name,
        last_name,
    };
    let account = ctx.api.edit_account(&token, &input).await?;
    println!("Updated account {}.", account.login);
    Ok(())
}

/// Change the account email address.
#[allow(clippy::print_stdout)]
pub async fn change_email(ctx: &AppContext, email: &Email) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    ctx.api.change_email(&token, email).await?;
    println!("Email changed to {email}.");
    Ok(())
}

/// Change the account password.
#[allow(clippy::print_stdout)]
pub async fn change_password(
    ctx: &AppContext,
    current: String,
    new: String,
) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    let input = ChangePasswordInput {
        current_password: SecretString::from(current),
        new_password: SecretString::from(new),
    };
    ctx.api.change_password(&token, &input).await?;
    println!("Password changed.");
    Ok(())
}

/// Change the display locale, both server-side and in local storage.
#[allow(clippy::print_stdout)]
pub async fn change_locale(ctx: &AppContext, locale: Locale) -> Result<(), CliError> {
    let token = ctx.bearer_token()?;
    ctx.api.change_locale(&token, locale).await?;
    println!("Locale changed to {locale}.");
    Ok(())
}

/// Register a new account.
#[allow(clippy::print_stdout)]
pub async fn register(
    ctx: &AppContext,
    login: String,
    email: Email,
    password: String,
    locale: Locale,
) -> Result<(), CliError> {
    let input = RegisterInput {
        login,
        email,
        password: SecretString::from(password),
        locale,
    };
    ctx.api.register(&input).await?;
    println!("Registered. Check your mail for the confirmation token.");
    Ok(())
}

/// Redeem a mailed confirmation token.
#[allow(clippy::print_stdout)]
pub async fn confirm(ctx: &AppContext, token: &str) -> Result<(), CliError> {
    ctx.api.confirm_registration(token).await?;
    println!("Account confirmed. You can sign in now.");
    Ok(())
}
