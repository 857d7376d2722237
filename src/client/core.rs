// File: ./src/client/core.rs
use crate::client::cert::NoVerifier;
use crate::config::Credentials;
use crate::error::StoreError;
use crate::model::adapter::{VTODO_CONTENT_TYPE, inject_alarms};
use crate::model::{Alarm, CalendarListEntry, Todo};
use crate::store::{CalendarStore, PersistedTask};

// Libdav imports
use libdav::caldav::{FindCalendarHomeSet, FindCalendars, GetCalendarResources};
use libdav::dav::{GetProperty, PutResource, WebDavClient};
use libdav::{CalDavClient, names};

use http::{Request, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower_http::auth::AddAuthorization;
use uuid::Uuid;

type HttpsClient = AddAuthorization<
    Client<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
        String,
    >,
>;

fn strip_host(href: &str) -> String {
    if let Ok(uri) = href.parse::<Uri>()
        && (uri.scheme().is_some() || uri.authority().is_some())
    {
        return uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
    }
    href.to_string()
}

fn join_path(collection: &str, leaf: &str) -> String {
    let base = strip_host(collection);
    if base.ends_with('/') {
        format!("{}{}", base, leaf)
    } else {
        format!("{}/{}", base, leaf)
    }
}

fn last_segment(href: &str) -> &str {
    href.trim_end_matches('/').rsplit('/').next().unwrap_or(href)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn mkcalendar_body(display_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<c:mkcalendar xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:set>
    <d:prop>
      <d:displayname>{}</d:displayname>
      <c:supported-calendar-component-set>
        <c:comp name="VTODO"/>
      </c:supported-calendar-component-set>
    </d:prop>
  </d:set>
</c:mkcalendar>"#,
        escape_xml(display_name)
    )
}

/// CalDAV implementation of [`CalendarStore`].
#[derive(Debug)]
pub struct RustyClient {
    client: CalDavClient<HttpsClient>,
    configured_home: Option<String>,
    home: OnceCell<Uri>,
}

impl RustyClient {
    pub fn new(url: &str, user: &str, pass: &str, insecure: bool) -> Result<Self, StoreError> {
        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| StoreError::InvalidUrl {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        let tls_config_builder = rustls::ClientConfig::builder();

        let tls_config = if insecure {
            tls_config_builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth()
        } else {
            let mut root_store = rustls::RootCertStore::empty();
            let result = rustls_native_certs::load_native_certs();
            root_store.add_parsable_certificates(result.certs);
            // Plain http servers (local test setups) need no roots.
            if root_store.is_empty() && uri.scheme_str() == Some("https") {
                return Err(StoreError::Tls(
                    "No valid system certificates found.".to_string(),
                ));
            }
            tls_config_builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        };

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let auth_client = AddAuthorization::basic(http_client, user, pass);
        let webdav = WebDavClient::new(uri, auth_client);
        Ok(Self {
            client: CalDavClient::new(webdav),
            configured_home: None,
            home: OnceCell::new(),
        })
    }

    pub fn from_credentials(creds: &Credentials) -> Result<Self, StoreError> {
        let mut client = Self::new(
            &creds.url,
            &creds.username,
            &creds.password,
            creds.allow_insecure_certs,
        )?;
        client.configured_home = creds.calendar_home.clone();
        Ok(client)
    }

    /// Uses `path` as the calendar home instead of discovering it.
    pub fn with_calendar_home(mut self, path: &str) -> Self {
        self.configured_home = Some(path.to_string());
        self
    }

    fn relative_uri(&self, path: &str) -> Result<Uri, StoreError> {
        self.client
            .webdav_client
            .relative_uri(path)
            .map_err(|e| StoreError::InvalidUrl {
                url: path.to_string(),
                detail: format!("{:?}", e),
            })
    }

    // --- DISCOVERY ---

    async fn home_set(&self) -> Result<Uri, StoreError> {
        let home = self
            .home
            .get_or_try_init(|| async {
                if let Some(path) = &self.configured_home {
                    return self.relative_uri(path);
                }
                let principal = self
                    .client
                    .find_current_user_principal()
                    .await
                    .map_err(|e| StoreError::Discovery(format!("{:?}", e)))?
                    .ok_or_else(|| StoreError::Discovery("No principal".to_string()))?;

                let home_set_resp = self
                    .client
                    .request(FindCalendarHomeSet::new(principal.path()))
                    .await
                    .map_err(|e| StoreError::Discovery(format!("{:?}", e)))?;

                home_set_resp
                    .home_sets
                    .first()
                    .cloned()
                    .ok_or_else(|| StoreError::Discovery("No home set".to_string()))
            })
            .await?;
        Ok(home.clone())
    }

    async fn put_raw(&self, path: &str, ics: String) -> Result<Option<String>, StoreError> {
        let req = Request::builder()
            .method("PUT")
            .uri(self.relative_uri(path)?)
            .header(http::header::CONTENT_TYPE, VTODO_CONTENT_TYPE)
            .body(ics)
            .map_err(|e| StoreError::request("PUT", e))?;
        let (parts, _) = self
            .client
            .webdav_client
            .request_raw(req)
            .await
            .map_err(|e| StoreError::request("PUT", e))?;

        if !parts.status.is_success() {
            return Err(StoreError::Status {
                op: "PUT",
                path: path.to_string(),
                status: parts.status,
            });
        }
        Ok(parts
            .headers
            .get(http::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

impl CalendarStore for RustyClient {
    async fn find_list(&self, name: &str) -> Result<Option<CalendarListEntry>, StoreError> {
        let home = self.home_set().await?;
        let cals_resp = self
            .client
            .request(FindCalendars::new(home.path()))
            .await
            .map_err(|e| StoreError::request("PROPFIND calendars", e))?;

        for col in cals_resp.calendars {
            // Only a missing or empty displayname falls back to the path.
            let display = self
                .client
                .request(GetProperty::new(&col.href, &names::DISPLAY_NAME))
                .await
                .map_err(|e| StoreError::request("PROPFIND displayname", e))?
                .value
                .filter(|d| !d.trim().is_empty());

            let found = match display.as_deref() {
                Some(d) => d == name,
                None => last_segment(&col.href) == name,
            };
            if found {
                log::debug!("Found list '{}' at {}", name, col.href);
                return Ok(Some(CalendarListEntry {
                    name: name.to_string(),
                    href: col.href,
                }));
            }
        }
        Ok(None)
    }

    async fn create_list(&self, name: &str) -> Result<CalendarListEntry, StoreError> {
        let home = self.home_set().await?;
        let path = join_path(home.path(), &format!("{}/", Uuid::new_v4()));

        let req = Request::builder()
            .method("MKCALENDAR")
            .uri(self.relative_uri(&path)?)
            .header(http::header::CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(mkcalendar_body(name))
            .map_err(|e| StoreError::request("MKCALENDAR", e))?;
        let (parts, _) = self
            .client
            .webdav_client
            .request_raw(req)
            .await
            .map_err(|e| StoreError::request("MKCALENDAR", e))?;

        if !parts.status.is_success() {
            return Err(StoreError::Status {
                op: "MKCALENDAR",
                path,
                status: parts.status,
            });
        }
        log::info!("Created list '{}' at {}", name, path);
        Ok(CalendarListEntry {
            name: name.to_string(),
            href: path,
        })
    }

    async fn upsert_task(
        &self,
        list: &CalendarListEntry,
        todo: &Todo,
    ) -> Result<PersistedTask, StoreError> {
        let path = join_path(&list.href, &format!("{}.ics", todo.uid));
        // No If-Match / If-None-Match: an existing resource is overwritten.
        let etag = self.put_raw(&path, todo.to_ics()).await?;
        Ok(PersistedTask {
            uid: todo.uid.clone(),
            list_href: strip_host(&list.href),
            href: path,
            etag,
        })
    }

    async fn attach_alarms(
        &self,
        task: &PersistedTask,
        alarms: &[Alarm],
    ) -> Result<(), StoreError> {
        let missing = || StoreError::MissingTask {
            uid: task.uid.clone(),
        };

        let fetched = self
            .client
            .request(GetCalendarResources::new(&task.list_href).with_hrefs(vec![task.href.clone()]))
            .await
            .map_err(|e| StoreError::request("MULTIGET", e))?;

        let item = fetched
            .resources
            .into_iter()
            .find(|r| strip_host(&r.href) == task.href)
            .ok_or_else(missing)?;
        let content = item
            .content
            .map_err(|e| StoreError::request("MULTIGET", e))?;

        let ics = inject_alarms(&content.data, alarms).ok_or_else(missing)?;
        self.client
            .request(PutResource::new(&task.href).update(ics, VTODO_CONTENT_TYPE, &content.etag))
            .await
            .map_err(|e| StoreError::request("PUT", e))?;
        log::debug!("Attached {} alarm(s) to {}", alarms.len(), task.uid);
        Ok(())
    }
}
