//! # md-manage
//!
//! Command-line tool that attaches annotations to dataset result files. Each
//! annotation is validated, then appended to the `<stem>.annotations` file that
//! sits next to the results file.
//!
//! ## Usage
//!
//! ```bash
//! # Label a results file
//! md-manage label results.sdf label1 --value value1
//!
//! # Describe the fields it contains
//! md-manage fields results.sdf --origin "Supplier 1" --description "Docked poses" \
//!     -f "smiles,smiles,Standardized smiles,true" -f "score,number,Docking score"
//!
//! # Record the service run that produced it
//! md-manage service results.sdf --service "Jupyter notebook" --service-version 1.0 \
//!     --service-user User-1 --service-description "Docking" \
//!     --service-ref www.example.com/service.html -p param1=p-value1 \
//!     --origin "Supplier 1" --description "Docked poses" -f "score,number,Docking score"
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
