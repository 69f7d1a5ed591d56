//! Post-login warm-up.
//!
//! The app fires a fixed burst of calls right after the credentials are
//! accepted. Some of them must succeed for the session to be usable, the rest
//! only make the session look like a real device. The table below lists them
//! in order; [`Instagram::bootstrap`] walks it.

use serde_json::json;

use crate::api::constants::{
    URL_ACCOUNT_FAMILY, URL_BANYAN, URL_CONTACT_POINT_SIGNALS, URL_COOLDOWNS, URL_FETCH_CONFIG,
    URL_LOG_ATTRIBUTION, URL_MEDIA_BLOCKED, URL_NDX_STEPS, URL_NOTIF_BADGE,
    URL_SCORES_BOOTSTRAP_USERS, URL_STORE_PUSH_PERMISSIONS,
};
use crate::api::types::{Cooldowns, ScoresBootstrapUsers};
use crate::api::{Instagram, ReqOptions};
use crate::error::{Error, Result};
use crate::feeds::{Activity, Discover, Inbox, Timeline};
use crate::media::cursor::Paginated;
use crate::session::Phase;

const BANYAN_VIEWS: &str = r#"["story_share_sheet","direct_user_search_nullstate","forwarding_recipient_sheet","threads_people_picker","direct_inbox_active_now","group_stories_share_sheet","call_recipients","reshare_share_sheet","direct_user_search_keypressed"]"#;

const SCORE_SURFACES: &str = r#"["autocomplete_user_list","coefficient_besties_list_ranking","coefficient_rank_recipient_user_suggestion","coefficient_ios_section_test_bootstrap_ranking","coefficient_direct_recipients_ranking_variant_2"]"#;

/// Whether a failing step aborts the login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Fatal,
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ZrToken,
    AccountFamily,
    SyncB,
    NdxSteps,
    Timeline,
    NotificationBadge,
    Banyan,
    MediaBlocked,
    Cooldowns,
    Discover,
    LoomConfig,
    ScoresBootstrapUsers,
    Activity,
    LogAttribution,
    StorePushPermissions,
    InboxSnapshot,
    ContactPointSignals,
}

/// One row of the warm-up table.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub kind: StepKind,
    action: Action,
}

const fn step(name: &'static str, kind: StepKind, action: Action) -> Step {
    Step { name, kind, action }
}

/// Warm-up calls in the order the app makes them.
pub const BOOTSTRAP_STEPS: &[Step] = &[
    step("zr_token", StepKind::Fatal, Action::ZrToken),
    step("account_family", StepKind::Advisory, Action::AccountFamily),
    step("sync", StepKind::Fatal, Action::SyncB),
    step("ndx_steps", StepKind::Advisory, Action::NdxSteps),
    step("timeline", StepKind::Fatal, Action::Timeline),
    step("notification_badge", StepKind::Advisory, Action::NotificationBadge),
    step("banyan", StepKind::Advisory, Action::Banyan),
    step("media_blocked", StepKind::Advisory, Action::MediaBlocked),
    step("cooldowns", StepKind::Advisory, Action::Cooldowns),
    step("discover", StepKind::Advisory, Action::Discover),
    step("loom_config", StepKind::Advisory, Action::LoomConfig),
    step("scores_bootstrap_users", StepKind::Advisory, Action::ScoresBootstrapUsers),
    step("activity", StepKind::Fatal, Action::Activity),
    step("log_attribution", StepKind::Advisory, Action::LogAttribution),
    step("store_push_permissions", StepKind::Advisory, Action::StorePushPermissions),
    step("inbox_snapshot", StepKind::Fatal, Action::InboxSnapshot),
    step("contact_point_signals", StepKind::Advisory, Action::ContactPointSignals),
];

/// What the warm-up fetched, so the first pages are not requested twice.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub timeline: Timeline,
    pub activity: Activity,
    pub inbox: Inbox,
    pub discover: Discover,
    /// Advisory steps that failed, with the error text.
    pub advisory_failures: Vec<(&'static str, String)>,
}

async fn first_page<P: Paginated>(cursor: &mut P, insta: &Instagram) -> Result<()> {
    if cursor.next(insta).await {
        Ok(())
    } else {
        Err(Error::Api(
            cursor
                .error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "no page returned".into()),
        ))
    }
}

impl Instagram {
    /// Run the warm-up table and mark the session ready.
    pub async fn bootstrap(&self) -> Result<BootstrapReport> {
        self.require_account().await?;
        let mut report = BootstrapReport::default();

        for step in BOOTSTRAP_STEPS {
            tracing::debug!("Bootstrap step {}", step.name);
            let Err(e) = self.run_step(step.action, &mut report).await else {
                continue;
            };

            match step.kind {
                StepKind::Fatal => {
                    return Err(Error::Bootstrap {
                        step: step.name,
                        reason: e.to_string(),
                    })
                }
                StepKind::Advisory => {
                    self.report(step.name, &e);
                    report.advisory_failures.push((step.name, e.to_string()));
                }
            }
        }

        self.state.write().await.phase = Phase::Ready;
        tracing::info!(
            "Session ready ({} advisory failures)",
            report.advisory_failures.len()
        );
        Ok(report)
    }

    async fn run_step(&self, action: Action, report: &mut BootstrapReport) -> Result<()> {
        let (account_id, uuid, family_id) = {
            let state = self.state.read().await;
            (
                state.account_id().unwrap_or_default().to_string(),
                state.uuid.clone(),
                state.family_id.clone(),
            )
        };

        match action {
            Action::ZrToken => self.zr_token().await,
            Action::SyncB => self.sync_b().await,
            Action::AccountFamily => self.get_quietly(ReqOptions::get(URL_ACCOUNT_FAMILY)).await,
            Action::NdxSteps => self.get_quietly(ReqOptions::get(URL_NDX_STEPS)).await,
            Action::MediaBlocked => self.get_quietly(ReqOptions::get(URL_MEDIA_BLOCKED)).await,
            Action::LoomConfig => self.get_quietly(ReqOptions::get(URL_FETCH_CONFIG)).await,
            Action::Banyan => {
                self.get_quietly(ReqOptions::get(URL_BANYAN).query("views", BANYAN_VIEWS))
                    .await
            }
            Action::NotificationBadge => {
                let opts = ReqOptions::post(URL_NOTIF_BADGE)
                    .query("phone_id", family_id)
                    .query("user_ids", account_id)
                    .query("device_id", uuid.clone())
                    .query("_uuid", uuid);
                self.get_quietly(opts).await
            }
            Action::Cooldowns => {
                let opts = ReqOptions::get(URL_COOLDOWNS).form(self.sign("{}"));
                let cooldowns: Cooldowns = self.request_json(opts).await?;
                tracing::debug!("Global cooldown {}s", cooldowns.global);
                Ok(())
            }
            Action::ScoresBootstrapUsers => {
                let opts = ReqOptions::get(URL_SCORES_BOOTSTRAP_USERS).query("surfaces", SCORE_SURFACES);
                let scores: ScoresBootstrapUsers = self.request_json(opts).await?;
                tracing::debug!("Bootstrap scores for {} users", scores.users.len());
                Ok(())
            }
            Action::LogAttribution => {
                self.get_quietly(ReqOptions::post(URL_LOG_ATTRIBUTION).form(self.sign("{}")))
                    .await
            }
            Action::StorePushPermissions => {
                let opts = ReqOptions::post(URL_STORE_PUSH_PERMISSIONS)
                    .query("enabled", "true")
                    .query("device_id", uuid.clone())
                    .query("_uuid", uuid);
                self.get_quietly(opts).await
            }
            Action::ContactPointSignals => {
                let payload = json!({
                    "phone_id": family_id,
                    "_uid": account_id,
                    "device_id": uuid,
                    "_uuid": uuid,
                    "google_tokens": "[]",
                });
                let form = self.sign(&serde_json::to_string(&payload)?);
                self.get_quietly(ReqOptions::post(URL_CONTACT_POINT_SIGNALS).form(form))
                    .await
            }
            Action::Timeline => first_page(&mut report.timeline, self).await,
            Action::Activity => first_page(&mut report.activity, self).await,
            Action::Discover => first_page(&mut report.discover, self).await,
            Action::InboxSnapshot => {
                if report.inbox.initial_snapshot(self).await {
                    Ok(())
                } else {
                    Err(Error::Api(
                        report
                            .inbox
                            .error()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                    ))
                }
            }
        }
    }

    /// Send a call whose body the client has no use for.
    async fn get_quietly(&self, opts: ReqOptions) -> Result<()> {
        self.send_request(opts).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::api::{ClientSettings, HttpResponse};
    use crate::session::login::tests::mock_login_routes;
    use std::sync::{Arc, Mutex};

    fn fragment_of(url: &str) -> Option<&'static str> {
        [
            ("zr/token/result/", "zr_token"),
            ("multiple_accounts/", "account_family"),
            ("b.i.instagram.com/api/v1/launcher/sync/", "sync"),
            ("devices/ndx/", "ndx_steps"),
            ("feed/timeline/", "timeline"),
            ("notifications/badge/", "notification_badge"),
            ("banyan/", "banyan"),
            ("media/blocked/", "media_blocked"),
            ("qp/get_cooldowns/", "cooldowns"),
            ("discover/topical_explore/", "discover"),
            ("loom/fetch_config/", "loom_config"),
            ("scores/bootstrap/users/", "scores_bootstrap_users"),
            ("news/inbox/", "activity"),
            ("attribution/log_attribution/", "log_attribution"),
            ("store_client_push_permissions/", "store_push_permissions"),
            ("direct_v2/inbox/", "inbox_snapshot"),
            ("process_contact_point_signals/", "contact_point_signals"),
        ]
        .into_iter()
        .find(|(fragment, _)| url.contains(fragment))
        .map(|(_, name)| name)
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(BOOTSTRAP_STEPS.len(), 17);
        let fatal: Vec<_> = BOOTSTRAP_STEPS
            .iter()
            .filter(|s| s.kind == StepKind::Fatal)
            .map(|s| s.name)
            .collect();
        assert_eq!(
            fatal,
            vec!["zr_token", "sync", "timeline", "activity", "inbox_snapshot"]
        );
    }

    #[tokio::test]
    async fn test_steps_run_in_table_order() {
        let mock = Arc::new(MockTransport::new());
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock.clone());
        insta.login().await.unwrap();

        let login_at = mock
            .requests()
            .iter()
            .position(|r| r.url.contains("accounts/login/"))
            .unwrap();
        let order: Vec<_> = mock.requests()[login_at + 1..]
            .iter()
            .filter_map(|r| fragment_of(&r.url))
            .collect();
        let expected: Vec<_> = BOOTSTRAP_STEPS.iter().map(|s| s.name).collect();
        assert_eq!(order, expected);

        let cooldowns = mock
            .requests()
            .into_iter()
            .find(|r| r.url.contains("qp/get_cooldowns/"))
            .unwrap();
        assert!(cooldowns.url.contains("signed_body=SIGNATURE.%7B%7D"));
    }

    #[tokio::test]
    async fn test_advisory_failure_continues() {
        let mock = Arc::new(MockTransport::new());
        mock.on("banyan/", HttpResponse::new(500, "boom"));
        mock_login_routes(&mock);
        let mut insta =
            Instagram::with_transport("alice", "pw", ClientSettings::default(), mock.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        insta.set_error_handler(move |context, _| sink.lock().unwrap().push(context.to_string()));

        let report = insta.login().await.unwrap();

        assert_eq!(report.advisory_failures.len(), 1);
        assert_eq!(report.advisory_failures[0].0, "banyan");
        assert_eq!(*seen.lock().unwrap(), vec!["banyan".to_string()]);
        assert_eq!(mock.count_matching("process_contact_point_signals/"), 1);
        assert_eq!(insta.phase().await, Phase::Ready);
    }

    #[tokio::test]
    async fn test_inbox_failure_aborts_after_password_is_gone() {
        let mock = Arc::new(MockTransport::new());
        mock.on("direct_v2/inbox/", HttpResponse::new(500, "down"));
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock.clone());

        match insta.login().await {
            Err(Error::Bootstrap { step, .. }) => assert_eq!(step, "inbox_snapshot"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
        assert!(!insta.state.read().await.has_password());
        assert_eq!(insta.phase().await, Phase::PendingBootstrap);
        assert_eq!(mock.count_matching("process_contact_point_signals/"), 0);
    }

    #[tokio::test]
    async fn test_report_carries_first_pages() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "feed/timeline/",
            r#"{"feed_items":[{"media_or_ad":{"id":"9"}}],"more_available":true,"next_max_id":"n"}"#,
        );
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock);

        let report = insta.login().await.unwrap();
        assert_eq!(report.timeline.items.len(), 1);
        assert_eq!(report.timeline.pages(), 1);
        assert!(report.inbox.is_exhausted());
    }

    #[tokio::test]
    async fn test_bootstrap_needs_account() {
        let mock = Arc::new(MockTransport::new());
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock.clone());
        assert!(matches!(insta.bootstrap().await, Err(Error::NotLoggedIn(_))));
        assert_eq!(mock.request_count(), 0);
    }
}
