use burn::{
    module::{Module, Param},
    nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig},
    tensor::{
        activation::{log_softmax, softmax},
        backend::Backend,
        Int, Tensor,
    },
};

/// Configuration for the token classification head
#[derive(burn::config::Config)]
pub struct HeadConfig {
    /// Size of the encoder's hidden states
    pub hidden_size: usize,

    /// Number of token labels
    pub num_labels: usize,

    /// Dropout applied to the hidden states while training
    #[config(default = 0.1)]
    pub dropout: f64,

    /// Standard deviation of the output weight initializer
    #[config(default = 0.02)]
    pub initializer_range: f64,
}

impl HeadConfig {
    /// Initialize the head with normally distributed weights and a zero bias
    pub fn init<B: Backend>(&self, device: &B::Device) -> Head<B> {
        let mut output = LinearConfig::new(self.hidden_size, self.num_labels)
            .with_initializer(Initializer::Normal {
                mean: 0.0,
                std: self.initializer_range,
            })
            .init(device);

        output.bias = Some(Param::from(Tensor::zeros([self.num_labels], device)));

        Head {
            dropout: DropoutConfig::new(self.dropout).init(),
            output,
            num_labels: self.num_labels,
        }
    }
}

/// Projects every token's hidden state onto the label space
#[derive(Module, Debug)]
pub struct Head<B: Backend> {
    /// Dropout on the hidden states
    pub dropout: Dropout,

    /// Linear projection: [hidden_size, num_labels]
    pub output: Linear<B>,

    /// Total number of labels
    pub num_labels: usize,
}

/// Everything the head derives from a batch
#[derive(Debug, Clone)]
pub struct HeadOutput<B: Backend> {
    /// Mean loss over every position: [1]
    pub loss: Tensor<B, 1>,

    /// Cross-entropy at each position: [batch_size, seq_length]
    pub per_example_loss: Tensor<B, 2>,

    /// Raw scores: [batch_size, seq_length, num_labels]
    pub logits: Tensor<B, 3>,

    /// Softmax over the labels: [batch_size, seq_length, num_labels]
    pub probabilities: Tensor<B, 3>,

    /// Most probable label id: [batch_size, seq_length]
    pub predictions: Tensor<B, 2, Int>,
}

impl<B: Backend> Head<B> {
    /// Compute logits for the given hidden states
    pub fn logits(&self, hidden_states: Tensor<B, 3>, training: bool) -> Tensor<B, 3> {
        let [batch_size, seq_length, hidden_size] = hidden_states.dims();

        let hidden_states = if training {
            self.dropout.forward(hidden_states)
        } else {
            hidden_states
        };

        self.output
            .forward(hidden_states.reshape([batch_size * seq_length, hidden_size]))
            .reshape([batch_size, seq_length, self.num_labels])
    }

    /// Full forward pass against the given labels
    pub fn forward(
        &self,
        hidden_states: Tensor<B, 3>,
        label_ids: Tensor<B, 2, Int>,
        training: bool,
    ) -> HeadOutput<B> {
        classification_outputs(self.logits(hidden_states, training), label_ids)
    }
}

/// Softmax, cross-entropy and argmax over the last dimension of the logits
pub fn classification_outputs<B: Backend>(
    logits: Tensor<B, 3>,
    label_ids: Tensor<B, 2, Int>,
) -> HeadOutput<B> {
    let [batch_size, seq_length, num_labels] = logits.dims();
    let device = logits.device();

    let probabilities = softmax(logits.clone(), 2);
    let log_probs = log_softmax(logits.clone(), 2);

    let per_example_loss = log_probs
        .reshape([batch_size * seq_length, num_labels])
        .gather(
            1,
            label_ids
                .to_device(&device)
                .reshape([batch_size * seq_length, 1]),
        )
        .reshape([batch_size, seq_length])
        .neg();

    let loss = per_example_loss.clone().mean();

    let predictions = probabilities
        .clone()
        .argmax(2)
        .reshape([batch_size, seq_length]);

    HeadOutput {
        loss,
        per_example_loss,
        logits,
        probabilities,
        predictions,
    }
}
