use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use iqu::config::Config;
use iqu::handlers::actions::{dispatch, Outcome};
use iqu::handlers::terminal::{parse_command, TerminalHost, HELP};
use iqu::host::Host;
use iqu::open_app;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().expect("loading configuration");
    let (mut app, backups) = open_app(&config).expect("opening todo store");
    let mut host = TerminalHost::new(std::io::stdout());

    host.message(HELP).expect("writing to stdout");
    host.render(&app.session.view(&app.search))
        .expect("writing to stdout");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed reading stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let action = {
            let view = app.session.view(&app.search);
            parse_command(&line, &view)
        };
        let result = action.and_then(|action| dispatch(&mut app, &mut host, action));

        match result {
            Ok(Outcome::Quit) => break,
            Ok(_) => {}
            Err(err) => {
                if let Err(err) = host.message(&format!("error: {err}")) {
                    warn!(error = %err, "failed writing error message");
                }
            }
        }
        if let Err(err) = host.render(&app.session.view(&app.search)) {
            warn!(error = %err, "failed rendering list");
            break;
        }
    }

    backups.shutdown().await;
    info!("bye");
}
