use arrow::util::display::{ArrayFormatter, FormatOptions};
use clap::Parser;
use docvalues::codec::{DocValuesReader, DocValuesWriter, copy_fields};
use docvalues::column::read_batch;
use docvalues::conf::Config;
use docvalues::core::{CliArgs, Command, setup_logging};
use docvalues::store::LocalDirectory;
use log::{info, warn};

fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = CliArgs::parse();
    info!(args = args; "docvalues started");

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let dir = LocalDirectory::open(&args.dir)?;
    let reader = DocValuesReader::open(&dir, &args.segment, args.max_doc)?;

    match args.command {
        Command::Fields => {
            for summary in reader.fields() {
                println!("{summary}");
            }
        }
        Command::Check => match reader.verify_checksum() {
            Ok(()) => println!("{}: ok", args.segment),
            Err(e) => {
                warn!("segment {} failed verification: {e}", args.segment);
                return Err(e.into());
            }
        },
        Command::Dump { field, limit } => {
            let docs: Vec<u32> = (0..limit.min(reader.max_doc())).collect();
            let batch = read_batch(&reader, &[field], Some(&docs))?;
            let options = FormatOptions::default().with_null("<none>");
            let formatter = ArrayFormatter::try_new(batch.column(0).as_ref(), &options)?;
            for (i, doc) in docs.iter().enumerate() {
                println!("{doc}\t{}", formatter.value(i));
            }
        }
        Command::Rewrite { target } => {
            if target == args.segment {
                anyhow::bail!("rewrite target must differ from source segment {target}");
            }
            let mut writer =
                DocValuesWriter::new(&dir, &target, reader.max_doc(), config.codec.clone())?;
            let copied = copy_fields(&reader, &mut writer)?;
            writer.finish()?;
            println!("{copied} fields written to {target}");
        }
    }
    Ok(())
}
