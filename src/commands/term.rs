use std::path::Path;

use anyhow::Result;
use schedulify_core::heuristic::detect_term;

use crate::commands::read_input;
use crate::render::Render;

pub fn run(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    println!("{}", detect_term(&text).render());
    Ok(())
}
