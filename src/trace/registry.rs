/// Template interning
///
/// Every distinct normalised SQL shape is assigned a dense u32 id on first
/// sight. The model stores ids everywhere; the registry is the only place
/// that can turn an id back into SQL text.
use fxhash::FxHashMap;

/// Bidirectional template ⇄ id map
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    template_to_id: FxHashMap<String, u32>,
    id_to_template: Vec<String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id for a normalised template, assigning the next dense id on
    /// first sight.
    pub fn id(&mut self, template: &str) -> u32 {
        if let Some(&id) = self.template_to_id.get(template) {
            return id;
        }
        let id = self.id_to_template.len() as u32;
        self.id_to_template.push(template.to_string());
        self.template_to_id.insert(template.to_string(), id);
        id
    }

    /// The template text for an id. Unknown ids render as the empty
    /// string, mirroring lookup misses in the map this replaces.
    pub fn template(&self, id: u32) -> &str {
        self.id_to_template
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The id for a template that has already been interned.
    pub fn lookup(&self, template: &str) -> Option<u32> {
        self.template_to_id.get(template).copied()
    }

    /// Number of distinct templates seen.
    pub fn len(&self) -> usize {
        self.id_to_template.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_template.is_empty()
    }
}
