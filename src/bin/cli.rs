use clap::{App, Arg, ArgMatches, SubCommand};
use shmstruct::{
    error::StructError, Buffer, Layout, RecordSpec, RegionConfig, Result, SharedBacking, SnapshotHeader,
    StructOptions, StructView,
};
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let fields = Arg::with_name("fields")
        .value_name("NAME:TAG")
        .help("Fields in declaration order, e.g. id:u32 samples:f32[2][3]")
        .required(true)
        .multiple(true);
    let optimize = Arg::with_name("optimize")
        .long("optimize")
        .help("Reorder fields by size, largest first");
    let no_align = Arg::with_name("no-align")
        .long("no-align")
        .help("Disable alignment padding");

    let matches = App::new("shmstruct-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Structured layout planner and shared region tool")
        .subcommand(
            SubCommand::with_name("plan")
                .about("Print the byte layout of a record")
                .arg(fields.clone())
                .arg(optimize.clone())
                .arg(no_align.clone()),
        )
        .subcommand(
            SubCommand::with_name("snapshot")
                .about("Create a file-backed region for a record and write its layout header")
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Region file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("header")
                        .short("o")
                        .long("header")
                        .value_name("HEADER")
                        .help("Where to write the header (default: FILE.layout)")
                        .takes_value(true),
                )
                .arg(fields)
                .arg(optimize)
                .arg(no_align),
        )
        .subcommand(
            SubCommand::with_name("inspect")
                .about("Attach to a region through its layout header and print every field")
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Region file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("header")
                        .short("o")
                        .long("header")
                        .value_name("HEADER")
                        .help("Layout header (default: FILE.layout)")
                        .takes_value(true),
                ),
        )
        .subcommand(SubCommand::with_name("info").about("Show version information"))
        .get_matches();

    match matches.subcommand() {
        ("plan", Some(plan_matches)) => handle_plan(plan_matches),
        ("snapshot", Some(snapshot_matches)) => handle_snapshot(snapshot_matches),
        ("inspect", Some(inspect_matches)) => handle_inspect(inspect_matches),
        ("info", Some(_)) => show_info(),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn parse_fields(matches: &ArgMatches) -> Result<RecordSpec> {
    let mut spec = RecordSpec::new();
    for field in matches.values_of("fields").into_iter().flatten() {
        let (name, tag) = field.split_once(':').ok_or_else(|| {
            StructError::invalid_parameter("fields", format!("expected NAME:TAG, got `{}`", field))
        })?;
        spec = spec.field(name, tag);
    }
    Ok(spec)
}

fn options(matches: &ArgMatches) -> StructOptions {
    StructOptions::new()
        .with_optimize_layout(matches.is_present("optimize"))
        .with_align(!matches.is_present("no-align"))
}

fn header_path(matches: &ArgMatches, file: &str) -> PathBuf {
    matches
        .value_of("header")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}.layout", file)))
}

fn print_layout(layout: &Layout) {
    println!("{:<24} {:>8} {:>6} {:>8}  dims", "field", "offset", "kind", "bytes");
    for entry in layout {
        println!(
            "{:<24} {:>8} {:>6} {:>8}  {:?}",
            entry.dotted_name(),
            entry.offset,
            entry.kind.name(),
            entry.total_size(),
            entry.dims
        );
    }
    println!("Total: {} bytes", layout.byte_length());
}

fn handle_plan(matches: &ArgMatches) -> Result<()> {
    let spec = parse_fields(matches)?;
    let layout = options(matches).planner().plan(&spec)?;
    print_layout(&layout);
    Ok(())
}

fn handle_snapshot(matches: &ArgMatches) -> Result<()> {
    let file = matches
        .value_of("file")
        .ok_or_else(|| StructError::invalid_parameter("file", "missing region file"))?;
    let spec = parse_fields(matches)?;
    let backing = SharedBacking::FileBacked { path: PathBuf::from(file) };
    let view = StructView::new(&spec, options(matches).with_shared_backing(backing))?;

    let header = header_path(matches, file);
    view.buffer().flush()?;
    view.snapshot()?.write_to(&header)?;

    print_layout(view.layout());
    println!("Created region '{}' ({} bytes), header '{}'", file, view.byte_length(), header.display());
    Ok(())
}

fn handle_inspect(matches: &ArgMatches) -> Result<()> {
    let file = matches
        .value_of("file")
        .ok_or_else(|| StructError::invalid_parameter("file", "missing region file"))?;
    let header = SnapshotHeader::read_from(header_path(matches, file))?;
    let region = Buffer::open_shared(&RegionConfig::open_file(file))?;
    let view = StructView::from_snapshot(&header.bind(&region)?)?;

    print_layout(view.layout());
    println!("Region: {} ({})", file, view.buffer().backing_name());
    for (name, node) in view.data().iter() {
        println!("{} = {:?}", name, node.read());
    }
    Ok(())
}

fn show_info() -> Result<()> {
    println!("shmstruct v{}", shmstruct::VERSION);
    println!("Shared backings: anonymous, file-backed{}", if cfg!(target_os = "linux") { ", memfd" } else { "" });
    println!("Snapshot format: v{}", shmstruct::view::SNAPSHOT_VERSION);
    Ok(())
}
