/// Which documents have a value for a field.
///
/// Storage is deferred until the first document without a value; a field
/// where every document has one costs no allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsWithField {
    max_doc: u32,
    // bit set = has value; None = all set
    words: Option<Box<[u32]>>,
}

impl DocsWithField {
    pub fn all(max_doc: u32) -> Self {
        Self {
            max_doc,
            words: None,
        }
    }

    pub(crate) fn from_fn(max_doc: u32, has_value: impl Fn(u32) -> bool) -> Self {
        let mut words: Option<Vec<u32>> = None;
        for doc in 0..max_doc {
            if !has_value(doc) {
                words.get_or_insert_with(|| {
                    // first gap: backfill the documents before it
                    let mut w = vec![0u32; (max_doc as usize).div_ceil(32)];
                    for prior in 0..doc as usize {
                        w[prior / 32] |= 1 << (prior % 32);
                    }
                    w
                });
            } else if let Some(w) = words.as_mut() {
                w[doc as usize / 32] |= 1 << (doc % 32);
            }
        }
        Self {
            max_doc,
            words: words.map(Vec::into_boxed_slice),
        }
    }

    /// False for documents outside `0..max_doc`.
    pub fn get(&self, doc: u32) -> bool {
        if doc >= self.max_doc {
            return false;
        }
        match &self.words {
            None => true,
            Some(words) => (words[doc as usize / 32] >> (doc % 32)) & 1 == 1,
        }
    }

    pub fn len(&self) -> u32 {
        self.max_doc
    }

    pub fn is_empty(&self) -> bool {
        self.max_doc == 0
    }

    /// Number of documents with a value.
    pub fn cardinality(&self) -> u32 {
        match &self.words {
            None => self.max_doc,
            Some(words) => words.iter().map(|w| w.count_ones()).sum(),
        }
    }
}
