//! instagram-private - CLI entry point.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use instagram_private::{
    api::{ClientSettings, Instagram},
    cli::{Args, Command},
    config::{parse_user_id, validate_config, ClientConfig},
    error::{exit_codes, Error, Result},
    feeds::Timeline,
    fs::{default_config_path, user_folder},
    media::{Item, Paginated, StoryMedia},
    output::{
        create_item_bar, create_spinner, print_account, print_banner, print_config_summary,
        print_error, print_info, print_item, print_success, print_summary, print_warning,
        RunStats,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

fn exit_code(e: &Error) -> i32 {
    match e {
        Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
            exit_codes::CONFIG_ERROR
        }
        Error::Bootstrap { .. }
        | Error::MissingKeyMaterial
        | Error::Encryption(_)
        | Error::NotLoggedIn(_) => exit_codes::LOGIN_ERROR,
        Error::Api(_) | Error::Instagram { .. } | Error::RateLimited => exit_codes::API_ERROR,
        Error::Upload(_) | Error::Media(_) | Error::Image(_) => exit_codes::UPLOAD_ERROR,
        _ => exit_codes::UNEXPECTED_ERROR,
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = ClientConfig::load_or_default(&config_path)?;
    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let session_path = config.session_path()?;
    print_config_summary(
        &config.account.username,
        &session_path.display().to_string(),
        config.network.proxy.as_deref(),
    );

    let settings = ClientSettings::from(&config);

    let command = match args.command {
        Command::Login { password } => {
            return login(&config, settings, password, &session_path).await;
        }
        command => command,
    };

    let mut insta = Instagram::import_path(&session_path, settings)
        .await
        .map_err(|e| {
            Error::NotLoggedIn(format!(
                "no usable session at {} ({}). Run `login` first",
                session_path.display(),
                e
            ))
        })?;
    apply_network(&mut insta, &config)?;
    if let Err(e) = insta.refresh_zr_token().await {
        print_warning(&format!("Could not refresh the zero-rating token: {}", e));
    }

    let mut stats = RunStats::default();
    match command {
        Command::Login { .. } => {}
        Command::Whoami => {
            let account = insta.sync_account().await?;
            print_account(&account);
        }
        Command::Timeline { pages, download } => {
            let mut timeline = Timeline::new();
            fetch_pages(&insta, &mut timeline, pages, |t| &t.items, &mut stats).await;
            list_and_download(&insta, &timeline.items, download.as_deref(), &mut stats).await;
            print_summary(&stats);
        }
        Command::Saved { pages, download } => {
            let account = insta
                .account()
                .await
                .ok_or_else(|| Error::NotLoggedIn("session has no account".into()))?;
            let mut saved = account.saved();
            fetch_pages(&insta, &mut saved, pages, |s| &s.items, &mut stats).await;
            list_and_download(&insta, &saved.items, download.as_deref(), &mut stats).await;
            print_summary(&stats);
        }
        Command::Stories { user_id, download } => {
            let mut stories = StoryMedia::for_user(parse_user_id(&user_id)?);
            stories.sync(&insta).await?;
            stats.record_page(stories.items().len());
            list_and_download(&insta, stories.items(), download.as_deref(), &mut stats).await;
            print_summary(&stats);
        }
        Command::UploadPhoto {
            path,
            caption,
            quality,
        } => {
            let file = tokio::fs::File::open(&path).await?;
            let spinner = create_spinner(&format!("Uploading {}...", path.display()));
            let result = insta.upload_photo(file, &caption, quality, 0).await;
            spinner.finish_and_clear();
            let item = result?;
            print_success(&format!("Posted {}", item.url()));
        }
        Command::UploadAlbum {
            paths,
            caption,
            quality,
        } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                files.push(tokio::fs::File::open(path).await?);
            }
            let spinner = create_spinner(&format!("Uploading {} photos...", paths.len()));
            let result = insta.upload_album(files, &caption, quality, 0).await;
            spinner.finish_and_clear();
            let item = result?;
            print_success(&format!("Posted album {}", item.url()));
        }
        Command::Logout => {
            insta.logout().await?;
            remove_session(&session_path).await?;
            print_success("Logged out");
            return Ok(());
        }
    }

    insta.export_path(&session_path).await?;
    Ok(())
}

async fn login(
    config: &ClientConfig,
    settings: ClientSettings,
    password: String,
    session_path: &Path,
) -> Result<()> {
    let mut insta = Instagram::with_settings(config.account.username.clone(), password, settings)?;
    apply_network(&mut insta, config)?;

    let spinner = create_spinner("Logging in...");
    let result = insta.login().await;
    spinner.finish_and_clear();
    let report = result?;

    for (step, reason) in &report.advisory_failures {
        print_warning(&format!("Bootstrap step {} failed: {}", step, reason));
    }
    insta.export_path(session_path).await?;
    if let Some(account) = insta.account().await {
        print_success(&format!("Logged in as @{}", account.username));
    }
    print_info(&format!("Session saved to {}", session_path.display()));
    Ok(())
}

/// Apply the transport-level options of the config to a client.
fn apply_network(insta: &mut Instagram, config: &ClientConfig) -> Result<()> {
    insta.set_signer(config.signer());
    if let Some(proxy) = &config.network.proxy {
        insta.set_proxy(proxy, config.network.insecure, config.network.force_http2)?;
    }
    Ok(())
}

/// Fetch up to `pages` pages, warning if the list broke off with an error.
async fn fetch_pages<P, F>(
    insta: &Instagram,
    cursor: &mut P,
    pages: usize,
    items: F,
    stats: &mut RunStats,
) where
    P: Paginated,
    F: Fn(&P) -> &Vec<Item>,
{
    for _ in 0..pages {
        let before = items(&*cursor).len();
        if !cursor.next(insta).await {
            break;
        }
        stats.record_page(items(&*cursor).len() - before);
    }
    if let Some(e) = cursor.error() {
        if !cursor.is_exhausted() {
            print_warning(&format!("Stopped early: {}", e));
        }
    }
}

async fn list_and_download(
    insta: &Instagram,
    items: &[Item],
    folder: Option<&Path>,
    stats: &mut RunStats,
) {
    for item in items {
        print_item(item);
    }

    let Some(folder) = folder else {
        return;
    };
    let bar = create_item_bar(items.len() as u64, "Downloading");
    for item in items {
        let result = match user_folder(folder, &item.user.username) {
            Ok(dir) => item.download(insta, &dir, None).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(done) => stats.record_download(done.kind),
            Err(e) => {
                bar.suspend(|| print_warning(&format!("{}: {}", item.id, e)));
                stats.record_failure();
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
}

async fn remove_session(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
