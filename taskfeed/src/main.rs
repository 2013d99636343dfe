//! Entry point for the taskfeed TUI. Parses args, resolves the profile and runs the App.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use taskfeed::app::App;
use taskfeed::logging::init_logging;
use taskfeed::profiles::{
    default_log_path, load_profiles, save_profiles, ProfileEntry, ProfileRequest, ResolveProfile,
};
use tracing::{info, warn};

const USAGE_FLAGS: &str =
    "[--tls-ca CERT_PEM|-t CERT_PEM] [--profile NAME|-P NAME] [--save] [--dry-run] [--log FILE] [http://HOST:PORT]";

struct ParsedArgs {
    url: Option<String>,
    tls_ca: Option<String>,
    profile: Option<String>,
    log: Option<String>,
    save: bool,
    dry_run: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "taskfeed".into());
    let mut url: Option<String> = None;
    let mut tls_ca: Option<String> = None;
    let mut profile: Option<String> = None;
    let mut log: Option<String> = None;
    let mut save = false; // --save
    let mut dry_run = false; // --dry-run

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Err(format!("Usage: {prog} {USAGE_FLAGS}"));
            }
            "--tls-ca" | "-t" => {
                tls_ca = it.next();
            }
            "--profile" | "-P" => {
                profile = it.next();
            }
            "--log" => {
                log = it.next();
            }
            "--save" => {
                save = true;
            }
            "--dry-run" => {
                dry_run = true;
            }
            _ if arg.starts_with("--tls-ca=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        tls_ca = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--profile=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        profile = Some(v.to_string());
                    }
                }
            }
            _ => {
                if url.is_none() {
                    url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. Usage: {prog} {USAGE_FLAGS}"));
                }
            }
        }
    }
    Ok(ParsedArgs {
        url,
        tls_ca,
        profile,
        log,
        save,
        dry_run,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let log_path = parsed
        .log
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_log_path);
    if let Err(e) = init_logging(&log_path) {
        eprintln!("taskfeed: logging disabled ({}): {e}", log_path.display());
    }

    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        tls_ca: parsed.tls_ca.clone(),
    };
    let resolved = req.resolve(&profiles_file);

    // Determine final connection parameters (and maybe mutated profiles to persist)
    let mut profiles_mut = profiles_file.clone();
    let (url, tls_ca): (String, Option<String>) = match resolved {
        ResolveProfile::Direct(u, t) => {
            if let Some(name) = parsed.profile.as_ref() {
                let entry = ProfileEntry {
                    url: u.clone(),
                    tls_ca: t.clone(),
                };
                match profiles_mut.profiles.get(name).cloned() {
                    None => {
                        // New profile: auto-save immediately
                        profiles_mut.profiles.insert(name.clone(), entry);
                        persist(&profiles_mut);
                    }
                    Some(existing) if existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!(
                                "Overwrite existing profile '{name}'? [y/N]: "
                            ));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry);
                            persist(&profiles_mut);
                        }
                    }
                    Some(_) => {}
                }
            }
            (u, t)
        }
        ResolveProfile::Loaded(u, t) => (u, t),
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let picked = line
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|idx| (1..=names.len()).contains(idx))
                .and_then(|idx| profiles_mut.profiles.get(&names[idx - 1]));
            match picked {
                Some(entry) => (entry.url.clone(), entry.tls_ca.clone()),
                None => return Ok(()),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter URL (http://HOST:PORT or https://...): ")?;
            if url.trim().is_empty() {
                return Ok(());
            }
            let ca = prompt_string("Enter TLS CA path (or leave blank): ")?;
            let ca_opt = if ca.trim().is_empty() {
                None
            } else {
                Some(ca.trim().to_string())
            };
            profiles_mut.profiles.insert(
                name.clone(),
                ProfileEntry {
                    url: url.trim().to_string(),
                    tls_ca: ca_opt.clone(),
                },
            );
            persist(&profiles_mut);
            (url.trim().to_string(), ca_opt)
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            return Ok(());
        }
    };

    if parsed.dry_run {
        info!(%url, "dry run, not connecting");
        return Ok(());
    }

    let mut app = App::new(&url, &profiles_mut.display);
    app.run(tls_ca.as_deref()).await
}

fn persist(p: &taskfeed::profiles::ProfilesFile) {
    if let Err(e) = save_profiles(p) {
        warn!("saving profiles failed: {e}");
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
