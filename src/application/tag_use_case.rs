// ============================================================
// Layer 2 — TagUseCase
// ============================================================
// Loads a trained model once and tags whitespace-separated
// sentences with semantic-role names, word by word.

use anyhow::Result;
use burn::prelude::*;

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::{TaggedWord, Tagger};

pub struct TagUseCase<B: Backend = burn::backend::Wgpu> {
    tagger: Tagger<B>,
}

impl TagUseCase<burn::backend::Wgpu> {
    pub fn new(models_dir: &str, model_name: &str) -> Result<Self> {
        Self::on_device(models_dir, model_name, burn::backend::wgpu::WgpuDevice::default())
    }
}

impl<B: Backend> TagUseCase<B> {
    pub fn on_device(models_dir: &str, model_name: &str, device: B::Device) -> Result<Self> {
        let ckpt = CheckpointManager::new(models_dir, model_name);
        Ok(Self { tagger: Tagger::load(&ckpt, device)? })
    }

    pub fn tag(&self, sentence: &str) -> Result<Vec<TaggedWord>> {
        let words: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return Ok(Vec::new());
        }
        self.tagger.tag(&words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{tests::{tiny_config, write_corpus}, TrainUseCase};
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_tags_each_word_of_a_trained_model() {
        let data   = tempfile::tempdir().unwrap();
        let models = tempfile::tempdir().unwrap();
        write_corpus(data.path());
        TrainUseCase::new(tiny_config(data.path(), models.path()))
            .execute_on::<Autodiff<NdArray>>(Default::default(), false)
            .unwrap();

        let models_dir = models.path().display().to_string();
        let use_case = TagUseCase::<NdArray>::on_device(&models_dir, "tiny", Default::default()).unwrap();

        let tagged = use_case.tag("Mary sold books").unwrap();
        assert_eq!(
            tagged.iter().map(|t| t.word.as_str()).collect::<Vec<_>>(),
            vec!["Mary", "sold", "books"]
        );
        assert!(use_case.tag("   ").unwrap().is_empty());
    }
}
