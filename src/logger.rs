use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Once,
    },
};

static INIT: Once = Once::new();
static IS_INITIALIZED: AtomicBool = AtomicBool::new(false);

pub fn is_active() -> bool {
    IS_INITIALIZED.load(Ordering::SeqCst)
}

/// Log to `file`, creating its directory when missing.
pub fn start(id: &str, file: impl AsRef<Path>, verbose: bool) -> anyhow::Result<()> {
    let file = file.as_ref();
    if let Some(dir) = file.parent() {
        std::fs::create_dir_all(dir)?;
    }

    apply(dispatch(id, verbose)?.chain(fern::log_file(file)?))
}

pub fn start_console(id: &str, verbose: bool) -> anyhow::Result<()> {
    apply(dispatch(id, verbose)?.chain(std::io::stderr()))
}

fn level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    }
}

fn dispatch(id: &str, verbose: bool) -> anyhow::Result<fern::Dispatch> {
    if is_active() {
        anyhow::bail!("attempted to setup logger more than once");
    }

    let id = format!("{id}:{}", std::process::id());

    Ok(fern::Dispatch::new()
        .format(move |out, msg, record| {
            let time = humantime::format_rfc3339_seconds(std::time::SystemTime::now());

            if cfg!(debug_assertions) {
                out.finish(format_args!(
                    "[ {id} ] : [ {time} ] : [ {} {} ] : {msg}",
                    record.target(),
                    record.level(),
                ))
            } else {
                out.finish(format_args!("[ {id} ] : [ {time} ] : {msg}"))
            }
        })
        .level(level(verbose)))
}

fn apply(dispatch: fern::Dispatch) -> anyhow::Result<()> {
    dispatch.apply()?;
    log::trace!("started");

    INIT.call_once(|| IS_INITIALIZED.store(true, Ordering::SeqCst));
    Ok(())
}
