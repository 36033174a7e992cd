use std::path::Path;

use tokio::{
    fs::{self, File},
    io::{self, AsyncBufReadExt, AsyncWriteExt, Lines},
};

/// Read a file from the given path into a list of strings
pub async fn read_file(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let mut r = file_reader(path).await?;
    let mut lines = Vec::new();

    while let Some(line) = r.next_line().await? {
        lines.push(line);
    }

    Ok(lines)
}

/// Write a list of lines to the given path, creating parent directories as needed
pub async fn write_file(path: impl AsRef<Path>, lines: &[String]) -> io::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut f = File::create(path).await?;

    for line in lines {
        f.write_all(line.as_bytes()).await?;
        f.write_all(b"\n").await?;
    }

    f.flush().await
}

async fn file_reader(path: impl AsRef<Path>) -> io::Result<Lines<io::BufReader<File>>> {
    let f = File::open(path).await?;

    Ok(io::BufReader::new(f).lines())
}
