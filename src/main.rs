use chorus::ui;

#[tokio::main]
async fn main() {
    match chorus::cli::main().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            chorus::log_error!("Fatal: {:#}", e);
            ui::print_error(&format!("Error: {e:#}"));
            std::process::exit(1);
        }
    }
}
