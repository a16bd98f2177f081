use std::sync::Arc;

use anyhow::bail;
use fanout_core::{
    execute, Fetcher, GiphyClient, NewUser, Profile, ProfileClient, RequestId, ReqwestTransport,
    ResultSet, Scan, ScanStop, Transport, UreqTransport, User, UserClient,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Backend, Command, Config, GifCommand};
use crate::menu;

/// Everything a subcommand needs, built once at startup.
///
/// The transport is shared by every request the process makes and is dropped
/// with the `App` on exit.
pub struct App {
    fetcher: Fetcher<dyn Transport>,
    users: Arc<UserClient>,
    profiles: ProfileClient,
    giphy: GiphyClient,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let transport: Arc<dyn Transport> = match config.backend {
            Backend::Reqwest => Arc::new(ReqwestTransport::new(config.timeout)?),
            Backend::Ureq => Arc::new(UreqTransport::new(config.timeout)),
        };
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            fetcher: Fetcher::new(transport),
            users: Arc::new(UserClient::new(&config.users_url)),
            profiles: ProfileClient::new(&config.profiles_url),
            giphy: GiphyClient::new(&config.giphy_url, &config.giphy_api_key)
                .with_limit(config.giphy_limit),
        }
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Get { ids } => {
                let ids: Vec<RequestId> = ids.into_iter().map(RequestId::from).collect();
                let results = self.fetch_users(&ids).await;
                print_lines(render_users(&ids, &results));
                if results.all_failed() {
                    bail!("all {} requests failed", results.len());
                }
            }
            Command::Add {
                name,
                username,
                email,
            } => {
                let input = NewUser {
                    name,
                    username,
                    email,
                };
                println!("{}", self.add_user(&input).await);
            }
            Command::Delete { id } => {
                println!("{}", self.delete_user(&RequestId::from(id)).await);
            }
            Command::DeleteProfile { id } => {
                println!("{}", self.delete_profile(&RequestId::from(id)).await);
            }
            Command::Profiles { start, max } => {
                let scan = self.scan_profiles(start, max).await;
                print_lines(render_scan(&scan));
                if let ScanStop::Failed { id, error } = scan.stop {
                    bail!("profile {id} failed: {error}");
                }
            }
            Command::Gifs { query } => {
                print_lines(self.gifs(&query).await?);
            }
            Command::Menu => menu::run(self).await?,
        }
        Ok(())
    }

    /// Fan out one request per id; Ctrl-C cancels whatever is still in flight.
    pub async fn fetch_users(&self, ids: &[RequestId]) -> ResultSet<User> {
        let cancel = CancellationToken::new();
        let watcher = cancel_on_ctrl_c(cancel.clone());
        let results = self
            .fetcher
            .fetch_all_with_cancel(&self.users, ids, &cancel)
            .await;
        watcher.abort();
        results
    }

    pub async fn add_user(&self, input: &NewUser) -> &'static str {
        let users = &self.users;
        let outcome = match users.build_create_user(input) {
            Ok(request) => execute(self.fetcher.transport(), request, |r| users.parse_create_user(r)).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(created) => {
                tracing::info!(id = created.id, "user created");
                "User POST successful"
            }
            Err(error) => {
                tracing::warn!(%error, "user create failed");
                "User POST failed"
            }
        }
    }

    pub async fn delete_user(&self, id: &RequestId) -> &'static str {
        let users = &self.users;
        let request = users.build_delete_user(id);
        match execute(self.fetcher.transport(), request, |r| users.parse_delete_user(r)).await {
            Ok(()) => "User DELETE successful",
            Err(error) => {
                tracing::warn!(%id, %error, "user delete failed");
                "User DELETE failed"
            }
        }
    }

    pub async fn delete_profile(&self, id: &RequestId) -> &'static str {
        let profiles = &self.profiles;
        let request = profiles.build_delete_profile(id);
        match execute(self.fetcher.transport(), request, |r| profiles.parse_delete_profile(r)).await {
            Ok(()) => "User DELETE successful",
            Err(error) => {
                tracing::warn!(%id, %error, "profile delete failed");
                "User DELETE failed"
            }
        }
    }

    pub async fn scan_profiles(&self, start: u64, max: usize) -> Scan<Profile> {
        self.fetcher.scan(&self.profiles, start, max).await
    }

    pub async fn gifs(&self, query: &GifCommand) -> anyhow::Result<Vec<String>> {
        let giphy = &self.giphy;
        let request = match query {
            GifCommand::Search { query } => giphy.build_search(query)?,
            GifCommand::Trending => giphy.build_trending()?,
        };
        let page = execute(self.fetcher.transport(), request, |r| giphy.parse_gif_page(r)).await?;
        Ok(page
            .data
            .iter()
            .map(|gif| gif.original_url().to_string())
            .collect())
    }
}

fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling in-flight requests");
            token.cancel();
        }
    })
}

pub fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

/// One line per slot: the user's name, or the id and why it failed.
pub fn render_users(ids: &[RequestId], results: &ResultSet<User>) -> Vec<String> {
    ids.iter()
        .zip(results)
        .map(|(id, slot)| match slot {
            Ok(user) => user.name.clone(),
            Err(error) => format!("error: {id}: {error}"),
        })
        .collect()
}

pub fn render_scan(scan: &Scan<Profile>) -> Vec<String> {
    let mut lines: Vec<String> = scan
        .items
        .iter()
        .map(|p| format!("{} {}", p.full_name(), p.image))
        .collect();
    lines.push(match &scan.stop {
        ScanStop::Exhausted { next_id } => format!("end of profiles at id {next_id}"),
        ScanStop::Limit { next_id } => {
            format!("stopped after {} profiles, next id {next_id}", scan.items.len())
        }
        ScanStop::Failed { id, error } => format!("error: {id}: {error}"),
        ScanStop::Overflow { last_id } => format!("no ids left after {last_id}"),
    });
    lines
}
