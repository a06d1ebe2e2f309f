use super::{single_arg, Session};
use crate::error::AtticError;
use crate::installer;

pub fn run(session: &mut Session<'_>, args: &[String]) -> Result<(), AtticError> {
    let name = single_arg("uninstall", args)?;
    installer::uninstall(session, name)?;
    Ok(())
}
