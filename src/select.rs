use crate::types::{ChannelSpec, Electrode, RetrievalError, SelectionMode};

/// Outcome of channel resolution: concrete ids plus their display names.
///
/// Ids derived from labels are always in ascending dataset order, never in
/// the caller's order; id specs in select mode keep the caller's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannels {
    pub ids: Vec<usize>,
    pub names: Vec<String>,
}

impl ResolvedChannels {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolves a select/ignore specification against the dataset's full
/// ordered label list.
///
/// With no spec, every channel is selected. Label specs are validated up
/// front: any label absent from the dataset fails with
/// [`RetrievalError::UnknownChannel`] naming all missing labels, before any
/// data is fetched. Numeric ids are not range-checked (an out-of-range id
/// surfaces later as a remote failure); the display name of an id without a
/// label falls back to the id itself.
pub fn resolve_channels(
    all_labels: &[String],
    spec: Option<&ChannelSpec>,
) -> Result<ResolvedChannels, RetrievalError> {
    let ids = match spec {
        None => (0..all_labels.len()).collect(),
        Some(spec) => resolve_spec(all_labels, spec)?,
    };

    if ids.is_empty() {
        return Err(RetrievalError::InvalidInput(
            "channel selection resolves to no channels".to_string(),
        ));
    }

    let names = ids
        .iter()
        .map(|&id| {
            all_labels
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string())
        })
        .collect();

    Ok(ResolvedChannels { ids, names })
}

fn resolve_spec(all_labels: &[String], spec: &ChannelSpec) -> Result<Vec<usize>, RetrievalError> {
    if spec.electrodes.is_empty() {
        return Err(RetrievalError::InvalidInput(
            "electrode list is empty".to_string(),
        ));
    }

    // A single spec must be all labels or all ids.
    let mut labels = Vec::new();
    let mut ids = Vec::new();
    for electrode in &spec.electrodes {
        match electrode {
            Electrode::Label(label) => labels.push(label.clone()),
            Electrode::Id(id) => ids.push(*id),
        }
    }
    if !labels.is_empty() && !ids.is_empty() {
        return Err(RetrievalError::InvalidInput(
            "electrode list mixes labels and numeric ids".to_string(),
        ));
    }

    if !labels.is_empty() {
        resolve_labels(all_labels, &labels, spec.mode)
    } else {
        Ok(resolve_ids(all_labels, &ids, spec.mode))
    }
}

fn resolve_labels(
    all_labels: &[String],
    requested: &[String],
    mode: SelectionMode,
) -> Result<Vec<usize>, RetrievalError> {
    let missing: Vec<String> = requested
        .iter()
        .filter(|label| !all_labels.contains(*label))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(RetrievalError::UnknownChannel { labels: missing });
    }

    let selecting = mode == SelectionMode::Select;
    Ok(all_labels
        .iter()
        .enumerate()
        .filter(|(_, label)| requested.contains(*label) == selecting)
        .map(|(id, _)| id)
        .collect())
}

fn resolve_ids(all_labels: &[String], requested: &[usize], mode: SelectionMode) -> Vec<usize> {
    match mode {
        SelectionMode::Select => requested.to_vec(),
        SelectionMode::Ignore => (0..all_labels.len())
            .filter(|id| !requested.contains(id))
            .collect(),
    }
}
