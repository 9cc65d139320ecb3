use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    data: Option<PathBuf>,
    export: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    recap::app::run(recap::app::AppOptions {
        bundle_dir: args.data.unwrap_or_else(|| PathBuf::from("data")),
        export_path: args.export,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--data" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--data requires a directory path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--data cannot be empty");
                }
                out.data = Some(PathBuf::from(value.trim()));
            }
            "--export" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--export requires a file path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--export cannot be empty");
                }
                out.export = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("Recap");
    println!("  --data <dir>     Export bundle directory (default: ./data)");
    println!("  --export <path>  Shortlist export file (default: ./recap-shortlist.json)");
}
