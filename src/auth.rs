use anyhow::{Result, bail};
use std::io::{self, IsTerminal};
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "PEPPERBOX_PASSWORD";
pub const NEW_PASSWORD_ENV: &str = "PEPPERBOX_NEW_PASSWORD";

/// Reads an existing password.
///
/// Sources, in order: `env_var`, one line from piped stdin, a TTY prompt.
pub fn read_password(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    //  PEPPERBOX_PASSWORD="supersecret" pepperbox login alice
    if let Some(pw) = from_env(env_var) {
        return Ok(pw);
    }

    //  printf "%s\n" "$PW" | pepperbox login alice
    if !io::stdin().is_terminal() {
        let pw = read_line()?;
        if !pw.is_empty() {
            return Ok(pw);
        }
        bail!("no password provided");
    }

    let pw = Zeroizing::new(rpassword::prompt_password(prompt)?);
    if pw.is_empty() {
        bail!("no password provided");
    }
    Ok(pw)
}

/// Reads a new password, asking twice unless it comes from `env_var`.
pub fn read_new_password(env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = from_env(env_var) {
        return Ok(pw);
    }

    let (pw1, pw2) = if io::stdin().is_terminal() {
        (
            Zeroizing::new(rpassword::prompt_password("New password: ")?),
            Zeroizing::new(rpassword::prompt_password("Confirm password: ")?),
        )
    } else {
        (read_line()?, read_line()?)
    };

    if pw1.is_empty() {
        bail!("password cannot be empty");
    }
    if pw1 != pw2 {
        bail!("passwords do not match");
    }
    Ok(pw1)
}

fn from_env(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

fn read_line() -> Result<Zeroizing<String>> {
    let mut buf = Zeroizing::new(String::new());
    io::stdin().read_line(&mut buf)?;
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(buf)
}
