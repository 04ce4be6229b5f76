//! Basic Document Chunking
//!
//! Chunk a small manual and print what the pipeline decided.
//!
//! ```bash
//! RUST_LOG=strata=debug cargo run --example 01_basic_chunking
//! ```

use strata::{Context, DocumentChunker};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let document = "# Filter Replacement\n\n\
        The air handler draws room air through a pleated filter. \
        A clogged filter raises energy use and lets dust reach the coil. \
        Replace the filter every three months, or monthly during heavy use.\n\n\
        ## Procedure\n\n\
        Step 1: Switch the unit off at the thermostat.\n\
        Step 2: Slide the old filter out of the return vent.\n\
        Step 3: Insert the new filter with the arrow facing the blower.\n\
        Step 4: Switch the unit back on.\n\n\
        Q: What size filter do I need?\n\
        A: The size is printed on the frame of the old filter, for example 16x25x1.";

    let chunker = DocumentChunker::default();
    let result = chunker.chunk_document(Some(document), &Context::with_document_type("manual"));

    println!("Document: {} bytes", document.len());
    println!(
        "Strategy: {}, chunks: {}, average quality: {:.2}\n",
        result.metadata.strategy, result.metadata.total_chunks, result.metadata.average_quality
    );

    for chunk in &result.chunks {
        println!("{chunk}, heading: {:?}", chunk.contextual_info.heading);
        println!("    {}\n", chunk.content.replace('\n', "\n    "));
    }
}
