//! Account command implementations (login, signup, logout, whoami, reset-password)

use anyhow::Result;
use fintrack_core::{LoginForm, SignupForm};

use super::{reported, AlreadyReported, Client};

pub async fn cmd_login(client: &Client, email: &str, password: &str) -> Result<()> {
    let form = LoginForm {
        email: email.to_string(),
        password: password.to_string(),
    };
    let session = reported(client.login(&form).await)?;
    println!("   Signed in as {}", session.display_name);
    Ok(())
}

pub async fn cmd_signup(
    client: &Client,
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<()> {
    let form = SignupForm {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        confirm: confirm.to_string(),
    };
    reported(client.signup(&form).await)?;
    println!("   Next: fintrack login --email {}", email.trim());
    Ok(())
}

pub fn cmd_logout(client: &Client) -> Result<()> {
    reported(client.logout())
}

pub fn cmd_whoami(client: &Client) -> Result<()> {
    match client.session().get() {
        Some(session) => {
            println!();
            println!("👤 {}", client.session().display_name());
            if let Some(email) = &session.email {
                println!("   Email:   {}", email);
            }
            println!("   User ID: {}", session.user_id);
            println!();
            Ok(())
        }
        None => {
            eprintln!("Not logged in. Run: fintrack login --email <EMAIL> --password <PASSWORD>");
            Err(AlreadyReported.into())
        }
    }
}

pub fn cmd_reset_password(client: &Client, email: &str) -> Result<()> {
    reported(client.reset_password(email))
}
