use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Pad (or truncate) each row of ids to `seq_length`, typically to line up label or segment ids
/// with a tokenized and padded sequence
pub fn pad_to<B: Backend>(
    pad_id: usize,
    ids_list: Vec<Vec<usize>>,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = ids_list.len();

    let mut values = Vec::with_capacity(batch_size * seq_length);

    for ids in ids_list {
        let len = ids.len().min(seq_length);

        values.extend(ids.into_iter().take(len).map(|e| (e as i64).elem()));
        values.extend((len..seq_length).map(|_| (pad_id as i64).elem()));
    }

    Tensor::from_data(
        Data::new(values, Shape::new([batch_size, seq_length])),
        device,
    )
}
