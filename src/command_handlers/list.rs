use super::{no_args, Session};
use crate::error::AtticError;
use crate::installer;

pub fn run(session: &mut Session<'_>, args: &[String]) -> Result<(), AtticError> {
    no_args("list", args)?;
    installer::list(session)?;
    Ok(())
}
