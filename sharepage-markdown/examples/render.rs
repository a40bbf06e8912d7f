use std::{env, fs};

use sharepage_markdown::{MarkdownOptions, MarkdownProcessor};

const SAMPLE: &str = r"---
title: Sample note
tags: [demo]
---
# Sample

> [!tip] Callouts
> Work with **bold**, [[Wiki Links]] and $e^{i\pi} + 1 = 0$.

```mermaid
graph LR
  A --> B
```
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let (name, content) = match env::args().nth(1) {
    Some(path) => (path.clone(), fs::read_to_string(&path)?),
    None => ("Sample.md".to_string(), SAMPLE.to_string()),
  };

  let processor = MarkdownProcessor::new(MarkdownOptions::default());
  let doc = processor.render_document(&name, &content);

  println!("{}", doc.html);
  println!("---");
  println!("Title:       {}", doc.metadata.title);
  println!("Description: {}", doc.metadata.description);
  println!("Tags:        {:?}", doc.tags);
  println!("Headers:     {}", doc.headers.len());

  Ok(())
}
