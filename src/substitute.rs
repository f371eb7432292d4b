//! Placeholder substitution engine.
//!
//! Rewrites every text-bearing region of a document (body paragraphs,
//! table cells, section headers and footers), replacing placeholder
//! tokens inside individual runs so run-level formatting is preserved.
//! Placeholders are matched longest token first, so a token is never
//! partially shadowed by a shorter token that is its substring.
//!
//! Known limitation, kept deliberately: when a token is split across
//! multiple runs within one paragraph, the paragraph-level scan detects
//! it but no single run contains the full token, so nothing is replaced.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::container::DocumentContainer;
use crate::document::{Document, Paragraph};
use crate::error::SubstituteError;

/// Replace placeholder tokens in every text-bearing paragraph of `doc`.
///
/// Returns the number of run-level replacements performed. Whatever is
/// replaced stays replaced; there is no rollback on a partial match.
pub fn apply(doc: &mut Document, substitutions: &HashMap<String, String>) -> usize {
    // Longest token first so [NOME_COMPLETO] is never clipped by [NOME].
    let mut tokens: Vec<&String> = substitutions.keys().collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut replaced = 0usize;
    doc.for_each_paragraph_mut(|paragraph| {
        replaced += apply_to_paragraph(paragraph, &tokens, substitutions);
    });
    replaced
}

fn apply_to_paragraph(
    paragraph: &mut Paragraph,
    tokens: &[&String],
    substitutions: &HashMap<String, String>,
) -> usize {
    let mut replaced = 0usize;
    for token in tokens {
        // Scan the paragraph's visible text; replacement itself happens
        // per run to keep each run's formatting intact.
        if !paragraph.text().contains(token.as_str()) {
            continue;
        }
        let value = &substitutions[*token];
        for run in &mut paragraph.runs {
            if run.text.contains(token.as_str()) {
                run.text = run.text.replace(token.as_str(), value);
                replaced += 1;
            }
        }
    }
    replaced
}

/// Generate one document: open the template, substitute, save.
///
/// Fails when the substitution map is empty, the template cannot be
/// opened, or the result cannot be saved. Returns the replacement count.
pub fn generate(
    container: &dyn DocumentContainer,
    template_path: &Path,
    substitutions: &HashMap<String, String>,
    output_path: &Path,
) -> Result<usize, SubstituteError> {
    if substitutions.is_empty() {
        return Err(SubstituteError::EmptySubstitutionMap);
    }

    let mut doc = container.open(template_path)?;
    let replaced = apply(&mut doc, substitutions);
    container.save(&doc, output_path)?;

    debug!(
        template = %template_path.display(),
        output = %output_path.display(),
        replaced,
        "Document generated"
    );
    Ok(replaced)
}
