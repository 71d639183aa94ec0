//! Options for the host page's CKEditor instance.

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolbarGroup {
    pub name: &'static str,
    pub items: Vec<&'static str>,
}

fn group(name: &'static str, items: &[&'static str]) -> ToolbarGroup {
    ToolbarGroup {
        name,
        items: items.to_vec(),
    }
}

/// Toolbar rows. CKEditor expects one flat list with `"/"` between rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar(pub Vec<Vec<ToolbarGroup>>);

#[derive(Serialize)]
#[serde(untagged)]
enum ToolbarEntry<'a> {
    Group(&'a ToolbarGroup),
    RowBreak(&'static str),
}

impl Serialize for Toolbar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let groups: usize = self.0.iter().map(Vec::len).sum();
        let breaks = self.0.len().saturating_sub(1);
        let mut seq = serializer.serialize_seq(Some(groups + breaks))?;
        for (index, row) in self.0.iter().enumerate() {
            if index > 0 {
                seq.serialize_element(&ToolbarEntry::RowBreak("/"))?;
            }
            for entry in row {
                seq.serialize_element(&ToolbarEntry::Group(entry))?;
            }
        }
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    pub language: &'static str,
    pub ui_color: &'static str,
    pub height: u32,
    pub version_check: bool,
    #[serde(rename = "clipboard_handleImages")]
    pub clipboard_handle_images: bool,
    pub toolbar: Toolbar,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            language: "ko",
            ui_color: "#f4f4f4",
            height: 600,
            version_check: false,
            // images are uploaded through the board's own endpoint
            clipboard_handle_images: false,
            toolbar: Toolbar(vec![
                vec![
                    group(
                        "document",
                        &["Source", "-", "Save", "NewPage", "Preview", "Print", "-", "Templates"],
                    ),
                    group(
                        "clipboard",
                        &["Cut", "Copy", "Paste", "PasteText", "PasteFromWord", "-", "Undo", "Redo"],
                    ),
                    group("editing", &["Find", "Replace", "-", "SelectAll", "-", "Scayt"]),
                    group(
                        "insert",
                        &[
                            "Image",
                            "Table",
                            "HorizontalRule",
                            "Smiley",
                            "SpecialChar",
                            "PageBreak",
                            "Iframe",
                        ],
                    ),
                ],
                vec![
                    group(
                        "basicstyles",
                        &[
                            "Bold",
                            "Italic",
                            "Underline",
                            "Strike",
                            "Subscript",
                            "Superscript",
                            "-",
                            "RemoveFormat",
                        ],
                    ),
                    group(
                        "paragraph",
                        &[
                            "NumberedList",
                            "BulletedList",
                            "-",
                            "Outdent",
                            "Indent",
                            "-",
                            "Blockquote",
                            "CreateDiv",
                            "-",
                            "JustifyLeft",
                            "JustifyCenter",
                            "JustifyRight",
                            "JustifyBlock",
                            "-",
                            "BidiLtr",
                            "BidiRtl",
                        ],
                    ),
                    group("links", &["Link", "Unlink", "Anchor"]),
                ],
                vec![
                    group("styles", &["Format", "Font", "FontSize"]),
                    group("colors", &["TextColor", "BGColor"]),
                    group("tools", &["Maximize", "ShowBlocks"]),
                    group("about", &["About"]),
                ],
            ]),
        }
    }
}

impl EditorConfig {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
