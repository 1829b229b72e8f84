//! Feed-forward corrector network using Burn

use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::nn::{Linear, LinearConfig, Relu};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::activation::{sigmoid, tanh};
use burn::tensor::backend::AutodiffBackend;
use rand::seq::SliceRandom;

use crate::state::{RelativeState, STATE_DIM};

use super::{Corrector, CorrectorError, FitOutcome, OutputEncoding, TrainingBatch};

/// Configuration for the corrector network
#[derive(Debug, Config)]
pub struct CorrectorConfig {
    /// Width of both hidden layers
    pub hidden_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Samples per gradient step
    pub batch_size: usize,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            hidden_size: 16,
            learning_rate: 0.01,
            batch_size: 1,
        }
    }
}

/// Relative state in, bounded correction activations out
#[derive(Module, Debug)]
pub struct CorrectorNet<B: Backend> {
    input: Linear<B>,
    hidden: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> CorrectorNet<B> {
    pub fn new(device: &B::Device, output_size: usize, config: &CorrectorConfig) -> Self {
        Self {
            input: LinearConfig::new(STATE_DIM, config.hidden_size).init(device),
            hidden: LinearConfig::new(config.hidden_size, config.hidden_size).init(device),
            output: LinearConfig::new(config.hidden_size, output_size).init(device),
            activation: Relu::new(),
        }
    }

    /// `states`: [batch, STATE_DIM]. Sigmoid-bounded for the direct encoding,
    /// tanh-bounded for the signed one.
    pub fn forward(&self, states: Tensor<B, 2>, encoding: OutputEncoding) -> Tensor<B, 2> {
        let x = self.activation.forward(self.input.forward(states));
        let x = self.activation.forward(self.hidden.forward(x));
        let logits = self.output.forward(x);

        match encoding {
            OutputEncoding::Direct => sigmoid(logits),
            OutputEncoding::Signed => tanh(logits),
        }
    }
}

/// Weights detached for an off-thread training session
#[derive(Debug)]
pub struct CorrectorSnapshot<B: AutodiffBackend> {
    model: CorrectorNet<B>,
    encoding: OutputEncoding,
    config: CorrectorConfig,
    device: B::Device,
}

/// Corrector backed by a small Burn MLP.
///
/// Keeps two copies of the weights: the autodiff copy that training starts
/// from, and a plain copy for inference that only changes on `install`.
pub struct BurnCorrector<B: AutodiffBackend> {
    training: CorrectorNet<B>,
    inference: CorrectorNet<B::InnerBackend>,
    encoding: OutputEncoding,
    config: CorrectorConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> BurnCorrector<B> {
    pub fn new(device: B::Device, encoding: OutputEncoding, config: CorrectorConfig) -> Self {
        let training = CorrectorNet::new(&device, encoding.output_size(), &config);
        let inference = training.valid();

        Self {
            training,
            inference,
            encoding,
            config,
            device,
        }
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }
}

fn backend_error(error: impl std::fmt::Debug) -> CorrectorError {
    CorrectorError::Backend(format!("{:?}", error))
}

impl<B: AutodiffBackend> Corrector for BurnCorrector<B> {
    type Snapshot = CorrectorSnapshot<B>;

    fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn predict(&self, state: &RelativeState) -> Result<Vec<f32>, CorrectorError> {
        let input = Tensor::<B::InnerBackend, 1>::from_floats(
            state.features().as_slice(),
            &self.device,
        )
        .reshape([1, STATE_DIM]);

        let values: Vec<f32> = self
            .inference
            .forward(input, self.encoding)
            .into_data()
            .to_vec()
            .map_err(backend_error)?;

        if values.len() != self.encoding.output_size() {
            return Err(CorrectorError::OutputSize {
                expected: self.encoding.output_size(),
                actual: values.len(),
            });
        }
        Ok(values)
    }

    fn snapshot(&self) -> CorrectorSnapshot<B> {
        CorrectorSnapshot {
            model: self.training.clone(),
            encoding: self.encoding,
            config: self.config.clone(),
            device: self.device.clone(),
        }
    }

    fn fit(
        snapshot: CorrectorSnapshot<B>,
        batch: TrainingBatch,
    ) -> Result<FitOutcome<CorrectorSnapshot<B>>, CorrectorError> {
        if batch.is_empty() {
            return Err(CorrectorError::EmptyBatch);
        }

        let output_size = snapshot.encoding.output_size();
        if let Some(bad) = batch.targets.iter().find(|t| t.len() != output_size) {
            return Err(CorrectorError::OutputSize {
                expected: output_size,
                actual: bad.len(),
            });
        }

        let CorrectorSnapshot {
            mut model,
            encoding,
            config,
            device,
        } = snapshot;

        let mut order: Vec<usize> = (0..batch.len()).collect();
        order.shuffle(&mut rand::rng());

        let mut optimizer = AdamConfig::new().init::<B, CorrectorNet<B>>();
        let mut total_loss = 0.0f32;
        let mut steps = 0usize;

        for chunk in order.chunks(config.batch_size.max(1)) {
            let states: Vec<f32> = chunk
                .iter()
                .flat_map(|&i| batch.states[i].iter().copied())
                .collect();
            let targets: Vec<f32> = chunk
                .iter()
                .flat_map(|&i| batch.targets[i].iter().copied())
                .collect();

            let states = Tensor::<B, 1>::from_floats(states.as_slice(), &device)
                .reshape([chunk.len(), STATE_DIM]);
            let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), &device)
                .reshape([chunk.len(), output_size]);

            let prediction = model.forward(states, encoding);
            let loss = MseLoss::new().forward(prediction, targets, Reduction::Mean);

            let loss_value = loss
                .clone()
                .into_data()
                .to_vec::<f32>()
                .map_err(backend_error)?
                .first()
                .copied()
                .unwrap_or(f32::NAN);
            if !loss_value.is_finite() {
                return Err(CorrectorError::Diverged);
            }

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            total_loss += loss_value;
            steps += 1;
        }

        Ok(FitOutcome {
            snapshot: CorrectorSnapshot {
                model,
                encoding,
                config,
                device,
            },
            loss: total_loss / steps as f32,
        })
    }

    fn install(&mut self, snapshot: CorrectorSnapshot<B>) {
        self.inference = snapshot.model.valid();
        self.training = snapshot.model;
    }
}
