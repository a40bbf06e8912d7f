/// Default configuration file written by `sharepage init`. Every field is
/// listed with its default so the file doubles as documentation.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# SharePage configuration file

# Directory containing the Markdown notes
notes_dir = "notes"

# Ordered note index (JSON array of file names). When missing, notes are
# discovered from notes_dir, most recently modified first.
# registry = "notes/file_index.json"

# Note holding the dashboard sections
dashboard = "_Dashboard"

# Prefix for every generated path when the site lives in a sub-directory
base_path = ""

# Origin used for canonical and Open Graph URLs
site_url = "https://notes.example.com"

# Path segment note pages are published under
note_prefix = "posts"

# Directory holding embedded images
images_dir = "images"

# Highlight fenced code blocks
highlight_code = true

# Turn single newlines into <br>
hard_breaks = true

# Output directory for `sharepage publish`
output_dir = "public"

# Directory with a note.html / dashboard.html template overriding the
# built-in ones
# template_dir = "templates"

site_title = "SharePage"

# Theme used by `sharepage css`
# highlight_theme = "InspiredGitHub"

[auto_discovery]
# Append notes that no dashboard section links to
enabled = true
# Treat notes with a YouTube thumbnail as videos
youtube_thumbnail_heuristic = true
youtube_title = "YouTube"
others_title = "Others"
# Add discovered videos to an explicit section titled like youtube_title
merge_into_explicit = false
"#;
