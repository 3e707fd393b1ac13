//! Watch a save directory

use crate::{util, SettingsArgs};
use anyhow::Result;

pub async fn run(settings: &SettingsArgs) -> Result<()> {
    let config = util::load_config(settings)?;
    crate::daemon::run(config).await
}
