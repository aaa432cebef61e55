// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use cashmonth::commands::{self, App};
use cashmonth::{cli, db, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let conn = db::open_or_init()?;
    let app = App::new(conn, matches.get_one::<String>("user").map(String::as_str))?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("login", sub)) => commands::users::login(&app, sub)?,
        Some(("logout", _)) => commands::users::logout(&app)?,
        Some(("whoami", _)) => commands::users::whoami(&app)?,
        Some(("config", sub)) => commands::settings::handle(&app, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&app, sub).await?,
        Some(("summary", sub)) => commands::summary::handle(&app, sub).await?,
        Some(("watch", sub)) => commands::watch::run(&app, sub).await?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
