use crate::command::update::UpdateArgs;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "update-stemcell",
    version,
    about = "Bump the stemcell version in a BOSH deployment manifest"
)]
pub struct StemcellCli {
    #[command(flatten)]
    pub update: UpdateArgs,
}
