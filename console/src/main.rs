extern crate sc_terminal_console;
extern crate tokio;

use clap::Parser;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use sc_terminal_console::text_feed::TextFeed;
use sc_terminal_console::transport::ReqwestTransport;
use sc_terminal_console::{init_logger, Args, ConsoleError};
use sc_terminal_frontend::{Controller, Gateway, Visibility};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ConsoleError> {
    init_logger();
    let args = Args::parse();
    let origin = args.origin()?;

    let feed = TextFeed::new(std::io::stdout(), origin.clone());
    let gateway = Gateway::new(ReqwestTransport::new()?, origin.clone());
    let controller = Controller::new(
        gateway,
        feed,
        args.member(),
        args.config(),
        Visibility::Open,
    );
    info!("connected to {} (type help)", origin);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !controller.run_command(line).await {
            controller.system_message(&format!("알 수 없는 명령어입니다: {} (help 입력)", line));
        }
    }
    Ok(())
}
