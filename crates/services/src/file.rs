//! File notifier
//!
//! Appends the notification body to the file named by the target's first
//! parameter. The path is interpolated against the job context, so one
//! target can fan out to per-device files (`/var/log/{device}.log`).
//!
//! Options:
//! - `append_newline` (bool) - terminate each body with `\n`
//! - `overwrite` (bool) - truncate instead of append

use std::fs::OpenOptions;
use std::io::Write;

use async_trait::async_trait;
use courier_protocol::Job;
use courier_transform::template;

use crate::{Notifier, ServiceContext, ServiceError};

/// Notifier that writes bodies to files
pub struct FileNotifier;

#[async_trait]
impl Notifier for FileNotifier {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn deliver(&self, ctx: &ServiceContext, job: &Job) -> Result<bool, ServiceError> {
        let Some(path_template) = ctx.first_param(&job.target.name) else {
            tracing::warn!(
                service = %ctx.name,
                target = %job.target.name,
                "file target declares no path parameter"
            );
            return Ok(false);
        };

        let path = template::render(path_template, &job.context);

        let mut text = job.body.clone();
        if ctx.opt_bool("append_newline").unwrap_or(false) {
            text.push('\n');
        }
        let overwrite = ctx.opt_bool("overwrite").unwrap_or(false);

        let result = OpenOptions::new()
            .create(true)
            .append(!overwrite)
            .write(true)
            .truncate(overwrite)
            .open(&path)
            .and_then(|mut f| f.write_all(text.as_bytes()));

        match result {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!(
                    service = %ctx.name,
                    path = %path,
                    error = %e,
                    "cannot write to file"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
