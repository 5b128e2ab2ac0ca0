//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "kypros", about = "multilingual corpus construction tool.")]
/// Holds every command that is callable by the `kypros` command.
pub enum Kypros {
    #[structopt(about = "Collect every configured source")]
    Collect(Collect),
    #[structopt(about = "Normalize, classify, filter, lemmatize and count a raw file")]
    Process(Process),
}

#[derive(Debug, StructOpt)]
/// Collect command and parameters.
pub struct Collect {
    #[structopt(parse(from_os_str), help = "YAML configuration file")]
    pub config: PathBuf,
    #[structopt(parse(from_os_str), help = "data directory")]
    pub dst: PathBuf,
}

#[derive(Debug, StructOpt)]
/// Process command and parameters.
pub struct Process {
    #[structopt(parse(from_os_str), help = "raw record file")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "data directory")]
    pub dst: PathBuf,
    #[structopt(
        parse(from_os_str),
        long = "config",
        help = "YAML configuration file (keywords and languages)"
    )]
    pub config: Option<PathBuf>,
    #[structopt(
        parse(from_os_str),
        long = "lid-path",
        help = "Path to fasttext LangID model",
        default_value = "lid.176.bin"
    )]
    pub lid_path: PathBuf,
    #[structopt(
        long = "udpipe-url",
        help = "UDPipe REST service url",
        default_value = "https://lindat.mff.cuni.cz/services/udpipe/api/"
    )]
    pub udpipe_url: String,
    #[structopt(
        long = "top-n",
        help = "number of words kept in frequency tables",
        default_value = "100"
    )]
    pub top_n: usize,
    #[structopt(
        long = "min-freq",
        help = "minimal n-gram frequency",
        default_value = "5"
    )]
    pub min_freq: usize,
    #[structopt(
        long = "min-length",
        help = "texts must be strictly longer than this (in characters)",
        default_value = "20"
    )]
    pub min_length: usize,
    #[structopt(
        long = "categories",
        help = "tag with these categories only (comma separated)",
        use_delimiter = true
    )]
    pub categories: Vec<String>,
}
