use super::{single_arg, Session};
use crate::error::AtticError;
use crate::installer;

pub fn run(session: &mut Session<'_>, args: &[String]) -> Result<(), AtticError> {
    let file = single_arg("install", args)?;
    installer::install(session, file)?;
    Ok(())
}
