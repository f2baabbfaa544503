//! Post export job.
//!
//! Streams the user's posts in creation order, accumulates them into a JSON
//! document, reports progress after each post, and delivers the finished
//! document to the user by mail. Delivery is synchronous: the routine only
//! returns once the message is handed off, so finalization never races the
//! result.

use serde_json::{json, Value};
use tracing::info;

use crate::context::JobContext;
use crate::error::TaskError;
use crate::mailer::{Attachment, OutboundMessage};

/// Routine name for the post export job.
pub const EXPORT_POSTS: &str = "export_posts";

/// Export every post of the owning user and mail the result.
pub async fn export_posts(ctx: JobContext, _args: Value) -> Result<(), TaskError> {
    ctx.report_progress(0)?;

    let store = ctx.store().clone();
    let user = store
        .get_user(ctx.user_id())?
        .ok_or_else(|| TaskError::NotFound(format!("user {}", ctx.user_id())))?;

    // Creation time ascending, the order readers expect in the export.
    let posts = store.posts_by_user(ctx.user_id())?;
    let total = posts.len();

    let mut data = Vec::with_capacity(total);
    for (i, post) in posts.iter().enumerate() {
        data.push(json!({
            "body": post.body,
            "timestamp": post.created_at.to_rfc3339(),
        }));
        // total > 0 here: the loop body never runs for an empty export.
        ctx.report_progress((100 * (i + 1) / total) as u8)?;
    }

    let document = serde_json::to_vec_pretty(&json!({ "posts": data }))?;

    let message = OutboundMessage::new("[chirp] Your posts", vec![user.email.clone()])
        .with_body(format!(
            "Dear {},\n\nPlease find attached the archive of your posts.",
            user.username
        ))
        .with_attachment(Attachment {
            filename: "posts.json".to_string(),
            content_type: "application/json".to_string(),
            data: document,
        });
    ctx.mailer().send(&message)?;

    info!(user_id = %ctx.user_id(), posts = total, "Export delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MemoryMailer;
    use crate::registry::JobRegistry;
    use chirp_storage::Store;
    use chirp_types::{Post, User};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        store: Arc<Store>,
        registry: Arc<JobRegistry>,
        mailer: Arc<MemoryMailer>,
        user: User,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(Store::open(temp.path()).unwrap());
        let user = User::new("susan", "susan@example.com");
        let mut session = store.session();
        session.create_user(&user).unwrap();
        session.commit().unwrap();

        Fixture {
            _temp: temp,
            store,
            registry: Arc::new(JobRegistry::new()),
            mailer: Arc::new(MemoryMailer::new()),
            user,
        }
    }

    fn context(fx: &Fixture, job_id: &str) -> JobContext {
        fx.registry.register(job_id, EXPORT_POSTS, &fx.user.user_id);
        JobContext::new(
            job_id.to_string(),
            fx.user.user_id.clone(),
            fx.store.clone(),
            fx.registry.clone(),
            fx.mailer.clone(),
            true,
        )
    }

    fn add_posts(fx: &Fixture, bodies: &[&str]) {
        for body in bodies {
            let mut session = fx.store.session();
            session
                .create_post(&Post::new(&fx.user.user_id, *body))
                .unwrap();
            session.commit().unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
    }

    #[tokio::test]
    async fn test_export_three_posts() {
        let fx = fixture();
        add_posts(&fx, &["first", "second", "third"]);

        export_posts(context(&fx, "job-1"), json!({})).await.unwrap();

        // floor(100*i/3) for i=1..3 plus the initial 0: four distinct values.
        let status = fx.registry.get_status("job-1").unwrap();
        assert_eq!(status.progress, 100);
        assert_eq!(status.progress_updates, 4);

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["susan@example.com".to_string()]);
        assert_eq!(sent[0].attachments.len(), 1);
        assert_eq!(sent[0].attachments[0].filename, "posts.json");

        let document: Value = serde_json::from_slice(&sent[0].attachments[0].data).unwrap();
        let posts = document["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 3);
        // Creation order ascending.
        assert_eq!(posts[0]["body"], "first");
        assert_eq!(posts[2]["body"], "third");
    }

    #[tokio::test]
    async fn test_export_zero_posts_reaches_zero_progress_without_error() {
        let fx = fixture();

        export_posts(context(&fx, "job-1"), json!({})).await.unwrap();

        // The empty export never divides by zero; finalization (done by the
        // worker) is what forces 100.
        assert_eq!(fx.registry.progress_of("job-1"), 0);
        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        let document: Value = serde_json::from_slice(&sent[0].attachments[0].data).unwrap();
        assert_eq!(document["posts"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_export_unknown_user_fails() {
        let fx = fixture();
        fx.registry.register("job-2", EXPORT_POSTS, "ghost");
        let ctx = JobContext::new(
            "job-2".to_string(),
            "ghost".to_string(),
            fx.store.clone(),
            fx.registry.clone(),
            fx.mailer.clone(),
            true,
        );

        let result = export_posts(ctx, json!({})).await;
        assert!(matches!(result, Err(TaskError::NotFound(_))));
        assert!(fx.mailer.sent().is_empty());
    }
}
