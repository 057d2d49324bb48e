//! Create a tag in every repository, or push all tags.

use crate::error::Result;
use crate::outcome::Verdict;
use crate::pipeline::{RepoContext, SyncOperation};
use crate::refspec::validate_ref_name;
use crate::status::Status;

use super::{plural, ref_exists, run_checked};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAction {
    /// Tag HEAD. A message makes it an annotated tag.
    Create {
        name: String,
        message: Option<String>,
    },
    /// Push all tags to the default remote.
    Push,
}

#[derive(Debug, Clone)]
pub struct TagOp {
    pub action: TagAction,
}

impl TagOp {
    pub fn new(action: TagAction) -> Self {
        Self { action }
    }

    fn remote<'c>(&self, ctx: &'c RepoContext<'_>) -> &'c str {
        ctx.info.remote.as_deref().unwrap_or("origin")
    }
}

impl SyncOperation for TagOp {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn validate(&self) -> Result<()> {
        match &self.action {
            TagAction::Create { name, .. } => validate_ref_name(name),
            TagAction::Push => Ok(()),
        }
    }

    fn requires_remote(&self) -> bool {
        self.action == TagAction::Push
    }

    fn blocks_on_conflicts(&self) -> bool {
        false
    }

    fn check(&self, ctx: &RepoContext<'_>) -> Result<Option<Verdict>> {
        match &self.action {
            TagAction::Create { name, .. } => {
                if ref_exists(&ctx.git, &format!("refs/tags/{}", name))? {
                    return Ok(Some(Verdict::new(
                        Status::Skipped,
                        format!("tag {} already exists", name),
                    )));
                }
                Ok(None)
            }
            TagAction::Push => {
                if ctx.git.output(&["tag", "-l"])?.trim().is_empty() {
                    return Ok(Some(Verdict::new(Status::NoTags, "no tags")));
                }
                Ok(None)
            }
        }
    }

    fn preview(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        Ok(match &self.action {
            TagAction::Create { name, .. } => {
                Verdict::new(Status::WouldCreateTag, format!("would create tag {}", name))
            }
            TagAction::Push => Verdict::new(
                Status::WouldPushTags,
                format!("would push tags to {}", self.remote(ctx)),
            ),
        })
    }

    fn execute(&self, ctx: &RepoContext<'_>) -> Result<Verdict> {
        let git = &ctx.git;
        match &self.action {
            TagAction::Create { name, message } => {
                match message {
                    Some(message) => {
                        run_checked(git, &["tag", "-a", name.as_str(), "-m", message.as_str()])?
                    }
                    None => run_checked(git, &["tag", name.as_str()])?,
                };
                Ok(Verdict::new(Status::TagCreated, format!("created tag {}", name)))
            }
            TagAction::Push => {
                let remote = self.remote(ctx);
                let out = run_checked(git, &["push", remote, "--tags"])?;
                let report = format!("{}\n{}", out.stdout, out.stderr);
                if report.contains("Everything up-to-date") {
                    return Ok(Verdict::new(Status::UpToDate, "tags already pushed"));
                }
                let pushed = report.matches("[new tag]").count();
                Ok(Verdict::new(
                    Status::TagPushed,
                    format!("pushed {} to {}", plural(pushed, "tag"), remote),
                ))
            }
        }
    }
}
