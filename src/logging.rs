//! Dual term+file logging and a hard ctrl-c handler, grounded on the
//! teacher repo's `lib.rs::init` / `crates/rbp-core::log` pattern.

/// Initialize combined terminal (info) + file (debug) logging under
/// `logs/`, and install a ctrl-c handler that exits immediately.
///
/// Diagnostic output for the master itself goes to stderr/terminal per
/// spec §7 ("Diagnostic output goes to stderr"); the file sink additionally
/// captures debug-level detail for post-mortem.
pub fn install() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/master-{time}.log")).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        log::warn!("interrupted, exiting");
        std::process::exit(0);
    });
}
