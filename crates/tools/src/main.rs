use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use assistant::AssistantClient;
use assistant::http::{HttpTransport, TokioSleeper};
use clap::{Parser, Subcommand};
use formats::ProvinceCollection;
use tools::{MeshStats, inspect, province_mesh, write_obj};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Dataset and assistant tooling for the Budaya map")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the province GeoJSON and cultural dataset
    Inspect {
        #[arg(long, default_value = "crates/apps/viewer_web/assets/indonesia.geojson")]
        geo: PathBuf,

        #[arg(long, default_value = "crates/apps/viewer_web/assets/budaya.json")]
        culture: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extrude one province and print stats, or export it as OBJ
    Mesh {
        #[arg(long, default_value = "crates/apps/viewer_web/assets/indonesia.geojson")]
        geo: PathBuf,

        /// Province name; matched by normalized key
        #[arg(long)]
        province: String,

        /// Use the thicker selected-province slab
        #[arg(long)]
        active: bool,

        /// Write Wavefront OBJ here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Ask the assistant endpoint about a city
    Ask {
        /// Server origin or full endpoint URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        endpoint: String,

        #[arg(long)]
        city: String,

        /// Question words
        #[arg(required = true)]
        question: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(args: Args) -> Result<(), String> {
    match args.command {
        Command::Inspect { geo, culture, json } => cmd_inspect(geo, culture, json),
        Command::Mesh {
            geo,
            province,
            active,
            out,
        } => cmd_mesh(geo, &province, active, out),
        Command::Ask {
            endpoint,
            city,
            question,
        } => cmd_ask(&endpoint, &city, &question.join(" ")),
    }
}

fn cmd_inspect(geo: PathBuf, culture: PathBuf, json: bool) -> Result<(), String> {
    let geo_bytes = fs::read(&geo).map_err(|e| format!("read {geo:?}: {e}"))?;
    let culture_bytes = fs::read(&culture).map_err(|e| format!("read {culture:?}: {e}"))?;
    let report = inspect(&geo_bytes, &culture_bytes)?;

    if json {
        let payload = serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))?;
        println!("{payload}");
        return Ok(());
    }

    println!("{}: {} features (blake3={})", geo.display(), report.feature_count, report.geo_blake3);
    println!(
        "{}: {} records (blake3={})",
        culture.display(),
        report.record_count,
        report.culture_blake3
    );
    for name in &report.missing_records {
        println!("missing record: {name}");
    }
    for key in &report.orphan_records {
        println!("orphan record: {key}");
    }
    Ok(())
}

fn cmd_mesh(geo: PathBuf, province: &str, active: bool, out: Option<PathBuf>) -> Result<(), String> {
    let text = fs::read_to_string(&geo).map_err(|e| format!("read {geo:?}: {e}"))?;
    let collection =
        ProvinceCollection::from_geojson_str(&text).map_err(|e| format!("geojson: {e}"))?;
    let (feature, mesh) = province_mesh(&collection, province, active)?;
    let stats = MeshStats::new(feature, &mesh);

    match out {
        Some(path) => {
            let file = fs::File::create(&path).map_err(|e| format!("create {path:?}: {e}"))?;
            let mut writer = BufWriter::new(file);
            write_obj(&mesh, &feature.name, &mut writer)
                .and_then(|_| writer.flush())
                .map_err(|e| format!("write {path:?}: {e}"))?;
            eprintln!(
                "wrote {} ({} vertices, {} triangles)",
                path.display(),
                stats.vertices,
                stats.triangles
            );
        }
        None => {
            let payload =
                serde_json::to_string_pretty(&stats).map_err(|e| format!("json: {e}"))?;
            println!("{payload}");
        }
    }
    Ok(())
}

fn cmd_ask(endpoint: &str, city: &str, question: &str) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("tokio runtime: {e}"))?;

    let transport = HttpTransport::new(endpoint);
    info!(url = transport.url(), city, "asking assistant");
    let client = AssistantClient::new(transport, TokioSleeper);

    let answer = runtime.block_on(client.ask(city, question, |attempt, max| {
        eprintln!("attempt {attempt}/{max}");
    }));
    match answer {
        Ok(answer) => println!("{answer}"),
        Err(failure) => {
            println!("{}", failure.user_message());
            return Err(failure.to_string());
        }
    }
    Ok(())
}
