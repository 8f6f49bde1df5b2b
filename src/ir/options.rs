//! Options shared by the format writers.

/// Whether a multi-individual dataset is split into one file per individual.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitIndividuals {
    /// Single-animal layout when the dataset has exactly one individual,
    /// otherwise one multi-animal file. Never splits into several files.
    #[default]
    Auto,
    /// One single-animal file per individual, named `<stem>_<individual><ext>`.
    Yes,
    /// One file holding every individual.
    No,
}

/// Options for writing a dataset to disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    /// Replace existing output files instead of failing.
    pub overwrite: bool,

    /// Split policy for formats with a single-animal layout.
    pub split_individuals: SplitIndividuals,
}

impl WriteOptions {
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn split_individuals(mut self, split: SplitIndividuals) -> Self {
        self.split_individuals = split;
        self
    }
}
