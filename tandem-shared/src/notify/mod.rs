/// Outbound email notifications
///
/// Email is strictly best-effort. The primary mutation (match created,
/// request resolved, onboarding completed) is already committed by the
/// time a notification is dispatched, so delivery failures are caught,
/// logged to the `email_log` table, and surfaced as [`SideEffectWarning`]s,
/// never as errors.
///
/// Batch sends settle every future and ignore individual failures, so one
/// bad address never blocks the rest of a match's "you've been matched"
/// emails.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tandem_shared::notify::{EmailTemplate, Notifier, NullMailer};
///
/// # async fn example(pool: sqlx::PgPool, member: tandem_shared::models::member::Member) {
/// let notifier = Notifier::new(Arc::new(NullMailer), pool);
///
/// let warning = notifier
///     .notify_member(&member, &EmailTemplate::Welcome { name: member.name.clone() })
///     .await;
/// assert!(warning.is_none());
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::SideEffectWarning;
use crate::models::email_log::{EmailLog, EmailStatus, NewEmailLog};
use crate::models::member::Member;

/// Email transport errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// Could not reach the email API
    #[error("email transport error: {0}")]
    Transport(String),

    /// The email API rejected the message
    #[error("email rejected (status {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// The emails this platform sends
#[derive(Debug, Clone, PartialEq)]
pub enum EmailTemplate {
    /// Signup invitation with a redemption link
    Invitation { link: String },

    /// Sent after onboarding completes
    Welcome { name: String },

    /// Sent to each member of a freshly created match
    MatchMade { partner_names: Vec<String> },

    /// Sent when an admin resolves a rematch request
    RematchResolved {
        approved: bool,
        admin_notes: Option<String>,
    },
}

impl EmailTemplate {
    /// Template name recorded in the email log
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::Invitation { .. } => "invitation",
            EmailTemplate::Welcome { .. } => "welcome",
            EmailTemplate::MatchMade { .. } => "match-made",
            EmailTemplate::RematchResolved { .. } => "rematch-resolved",
        }
    }

    /// Subject line
    pub fn subject(&self) -> String {
        match self {
            EmailTemplate::Invitation { .. } => "You're invited to Tandem".to_string(),
            EmailTemplate::Welcome { .. } => "Welcome to Tandem".to_string(),
            EmailTemplate::MatchMade { .. } => "You've been matched!".to_string(),
            EmailTemplate::RematchResolved { approved, .. } => {
                if *approved {
                    "Your rematch request was approved".to_string()
                } else {
                    "An update on your rematch request".to_string()
                }
            }
        }
    }

    /// Plain-text body
    pub fn render_text(&self) -> String {
        match self {
            EmailTemplate::Invitation { link } => format!(
                "You've been invited to join Tandem, the accountability partner \
                 platform.\n\nFinish signing up here: {}\n\nThis link expires in 7 days.",
                link
            ),
            EmailTemplate::Welcome { name } => format!(
                "Hi {},\n\nYour goal is set and you're in the matching pool. \
                 We'll email you as soon as we've found your accountability partner.",
                name
            ),
            EmailTemplate::MatchMade { partner_names } => format!(
                "Good news: you've been matched with {}.\n\nReach out and agree \
                 on your first check-in.",
                partner_names.join(", ")
            ),
            EmailTemplate::RematchResolved {
                approved,
                admin_notes,
            } => {
                let mut body = if *approved {
                    "Your rematch request was approved. We'll set up your new match \
                     shortly; your current match stays in place until then."
                        .to_string()
                } else {
                    "After review, we've decided to keep your current match in place."
                        .to_string()
                };
                if let Some(notes) = admin_notes {
                    body.push_str("\n\nNote from the team: ");
                    body.push_str(notes);
                }
                body
            }
        }
    }
}

/// Email transport seam
///
/// The concrete transport is configuration; everything above it only sees
/// this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// Mailer backed by an HTTP email API
pub struct HttpMailer {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, api_key: Option<String>, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let payload = serde_json::json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": body,
        });

        let mut request = self.http.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailerError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(())
    }
}

/// Mailer for environments without an email transport configured.
///
/// Logs the send and succeeds, the notification counterpart of the
/// cache's passthrough mode.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailerError> {
        tracing::info!(to, subject, "Email transport not configured, dropping email");
        Ok(())
    }
}

/// Dispatches templated emails and records every attempt in the email log
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    pool: PgPool,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, pool: PgPool) -> Self {
        Self { mailer, pool }
    }

    /// Sends one templated email to a known member.
    ///
    /// Returns a warning on failure instead of an error; the attempt is
    /// recorded in `email_log` either way.
    pub async fn notify_member(
        &self,
        member: &Member,
        template: &EmailTemplate,
    ) -> Option<SideEffectWarning> {
        self.dispatch(Some(member.id), &member.email, template).await
    }

    /// Sends one templated email to a bare address (pre-signup invitations)
    pub async fn notify_address(
        &self,
        email: &str,
        template: &EmailTemplate,
    ) -> Option<SideEffectWarning> {
        self.dispatch(None, email, template).await
    }

    /// Sends to every member of a batch, settling all sends; one failed
    /// address never blocks the rest.
    pub async fn notify_members<F>(
        &self,
        members: &[Member],
        template_for: F,
    ) -> Vec<SideEffectWarning>
    where
        F: Fn(&Member) -> EmailTemplate,
    {
        let sends = members.iter().map(|member| {
            let template = template_for(member);
            async move { self.notify_member(member, &template).await }
        });

        join_all(sends).await.into_iter().flatten().collect()
    }

    async fn dispatch(
        &self,
        member_id: Option<Uuid>,
        email: &str,
        template: &EmailTemplate,
    ) -> Option<SideEffectWarning> {
        let subject = template.subject();
        let body = template.render_text();

        let send_result = self.mailer.send(email, &subject, &body).await;

        let (status, error) = match &send_result {
            Ok(()) => (EmailStatus::Sent, None),
            Err(e) => {
                tracing::warn!(
                    recipient = email,
                    template = template.name(),
                    error = %e,
                    "Email delivery failed"
                );
                (EmailStatus::Failed, Some(e.to_string()))
            }
        };

        if let Err(e) = EmailLog::record(
            &self.pool,
            NewEmailLog {
                member_id,
                recipient: email,
                template: template.name(),
                subject: &subject,
                status,
                error: error.as_deref(),
            },
        )
        .await
        {
            tracing::warn!(error = %e, "Failed to record email log entry");
        }

        send_result
            .err()
            .map(|e| SideEffectWarning::email(format!("{}: {}", email, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_names() {
        assert_eq!(
            EmailTemplate::Invitation { link: "x".into() }.name(),
            "invitation"
        );
        assert_eq!(EmailTemplate::Welcome { name: "x".into() }.name(), "welcome");
        assert_eq!(
            EmailTemplate::MatchMade {
                partner_names: vec![]
            }
            .name(),
            "match-made"
        );
        assert_eq!(
            EmailTemplate::RematchResolved {
                approved: true,
                admin_notes: None
            }
            .name(),
            "rematch-resolved"
        );
    }

    #[test]
    fn test_match_made_body_lists_partners() {
        let template = EmailTemplate::MatchMade {
            partner_names: vec!["Ada".into(), "Grace".into()],
        };
        let body = template.render_text();
        assert!(body.contains("Ada, Grace"));
    }

    #[test]
    fn test_rematch_resolution_subjects_differ() {
        let approved = EmailTemplate::RematchResolved {
            approved: true,
            admin_notes: None,
        };
        let denied = EmailTemplate::RematchResolved {
            approved: false,
            admin_notes: None,
        };
        assert_ne!(approved.subject(), denied.subject());
    }

    #[test]
    fn test_rematch_resolution_includes_admin_notes() {
        let template = EmailTemplate::RematchResolved {
            approved: true,
            admin_notes: Some("will rematch soon".into()),
        };
        assert!(template.render_text().contains("will rematch soon"));
    }

    #[tokio::test]
    async fn test_null_mailer_always_succeeds() {
        let result = NullMailer.send("a@x.com", "subject", "body").await;
        assert!(result.is_ok());
    }
}
